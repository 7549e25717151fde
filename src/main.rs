use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    folder: Option<PathBuf>,
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    mediadeck::logging::init();

    mediadeck::app::run_with_startup(mediadeck::app::AppStartupOptions {
        folder: args.folder,
        files: args.files,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--folder" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--folder requires a directory");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--folder cannot be empty");
                }
                out.folder = Some(PathBuf::from(value.trim()));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with("--") => anyhow::bail!("unknown argument {other}"),
            file => out.files.push(PathBuf::from(file)),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("mediadeck [--folder <dir>] [FILE...]");
    println!("  --folder <dir>    Authorize and load a folder of mp3/mp4/m4a files");
    println!("  FILE...           Append files to the playlist");
}
