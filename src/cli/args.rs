use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "prodlist",
    version,
    about = "product listing: filter, sort and paginate product records",
    long_about = "prodlist loads product records from a JSON file or URL, filters them by title, sorts them by title or price and prints one page of results with a pager.\n\nExamples:\n  prodlist -i ./db.json\n  prodlist -i ./db.json -s shirt --sort price:desc -p 2 -l 20\n  prodlist -u https://dummyjson.com/products -o page.html\n\nTip: Use --config to persist the records source and page size."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the page to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'F',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json or html (inferred from --output when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'i',
        long = "in",
        visible_alias = "input",
        value_name = "FILE",
        help_heading = "Input",
        help = "Load records from a JSON file."
    )]
    pub input: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Load records from a JSON endpoint."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.prodlist/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write the default config file if it does not exist yet, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECS",
        help_heading = "Input",
        help = "HTTP timeout when loading records from a URL."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 's',
        long = "q",
        visible_alias = "search",
        value_name = "TEXT",
        default_value = "",
        help_heading = "Query",
        help = "Only keep records whose title contains TEXT (case-insensitive)."
    )]
    pub search: String,

    #[arg(
        short = 'S',
        long = "sort",
        value_name = "FIELD:DIR",
        help_heading = "Query",
        help = "Sort by title or price, ascending or descending (e.g. price:desc)."
    )]
    pub sort: Option<String>,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        allow_negative_numbers = true,
        help_heading = "Query",
        help = "Page to show (values below 1 show page 1)."
    )]
    pub page: Option<i64>,

    #[arg(
        short = 'l',
        long = "lim",
        visible_alias = "limit",
        value_name = "N",
        allow_negative_numbers = true,
        help_heading = "Query",
        help = "Records per page (values below 1 mean 1)."
    )]
    pub limit: Option<i64>,

    #[arg(
        short = 'm',
        long = "ms",
        visible_alias = "max-shown",
        value_name = "N",
        help_heading = "Pager",
        help = "Most page numbers to show before collapsing into '...' (at least 5)."
    )]
    pub max_shown: Option<usize>,

    #[arg(
        long = "org",
        visible_alias = "origin",
        value_name = "URL",
        help_heading = "Pager",
        help = "Origin of the page showing the listing, used to resolve //host and /path image URLs."
    )]
    pub origin: Option<String>,
}
