use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "todo-web",
    about = "A minimal todo list served as HTML pages."
)]
pub struct CommandLineArgs {
    /// Use a different database file.
    #[structopt(parse(from_os_str), short, long)]
    pub database_file: Option<PathBuf>,

    /// Address to listen on.
    #[structopt(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[structopt(short, long, default_value = "9000")]
    pub port: u16,

    /// Directory holding the log file and its archive.
    #[structopt(parse(from_os_str), long, default_value = "logs")]
    pub log_dir: PathBuf,
}
