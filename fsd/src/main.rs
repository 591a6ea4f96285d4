use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fsd::Server;
use fsys::FsManager;

#[derive(Parser)]
#[command(about = "TCP server for a single-image block file system")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: SocketAddr,

    /// Backing disk image path
    #[arg(short, long, default_value = "fsys.img")]
    disk: PathBuf,

    /// Serve this many connections, then exit
    #[arg(long)]
    max_conns: Option<usize>,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let manager = match FsManager::open(&args.disk) {
        Ok(manager) => manager,
        Err(err) => {
            eprintln!("fsd: cannot open disk image {:?}: {}", args.disk, err);
            return ExitCode::FAILURE;
        }
    };

    let server = match Server::bind(args.listen, manager) {
        Ok(server) => server,
        Err(err) => {
            eprintln!("fsd: cannot bind {}: {}", args.listen, err);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.max_conns {
        Some(max) => server.serve_limited(max),
        None => server.serve(),
    };
    if let Err(err) = result {
        eprintln!("fsd: server error: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
