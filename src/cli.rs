use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Ask a single question and exit (stdin is appended as context when piped)
    pub query: Option<String>,

    /// Gemini model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the generation API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Deliver answers in one piece instead of streaming them
    #[arg(long)]
    pub no_stream: bool,

    /// Log filter, e.g. `info` or `gyneassist=debug` (RUST_LOG takes precedence)
    #[arg(long)]
    pub log_level: Option<String>,
}
