use clap::Args;
use draftclock_core::KillFile;

#[derive(Args)]
pub struct RecoverArgs {
    /// Print every stashed draft, newest first
    #[arg(long)]
    all: bool,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: RecoverArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = KillFile::open_default()?;
    let mut entries = store.entries()?;
    if !args.all {
        entries.truncate(1);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("nothing to recover");
        return Ok(());
    }

    if args.all {
        for entry in &entries {
            println!("--- {} ---", entry.at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("{}", entry.text);
        }
    } else {
        print!("{}", entries[0].text);
        if !entries[0].text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
