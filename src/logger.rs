use simplelog::*;
use std::fs::File;
use std::path::Path;

pub fn init(data_dir: &Path, debug: bool) -> anyhow::Result<()> {
    let log_dir = data_dir.join("logs");
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)?;
    }

    let log_file = File::create(log_dir.join("terms_lens.log"))?;

    if debug {
        CombinedLogger::init(vec![
            TermLogger::new(
                LevelFilter::Debug,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ),
            WriteLogger::new(LevelFilter::Debug, Config::default(), log_file),
        ])?;
    } else {
        WriteLogger::init(LevelFilter::Info, Config::default(), log_file)?;
    }

    Ok(())
}
