//! TCP front end
//!
//! Accepts connections and runs one worker thread per client. Every worker
//! shares the single [`FsManager`] behind a mutex, so requests from
//! concurrent sessions serialize at the operation level and each response
//! reflects a complete operation.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread;

use fsys::FsManager;

use crate::proto::{self, Outcome};

pub struct Server {
    listener: TcpListener,
    manager: Arc<Mutex<FsManager>>,
}

impl Server {
    /// Bind the listen address and wrap the manager for sharing
    pub fn bind<A: ToSocketAddrs>(addr: A, manager: FsManager) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        log::info!("fsd: listening on {}", listener.local_addr()?);
        Ok(Server {
            listener,
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    /// Actual bound address, useful when binding port 0
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve forever, one detached worker thread per connection
    pub fn serve(&self) -> std::io::Result<()> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let manager = Arc::clone(&self.manager);
                    thread::spawn(move || handle_client(manager, stream));
                }
                Err(err) => log::warn!("fsd: accept failed: {}", err),
            }
        }
        Ok(())
    }

    /// Serve exactly `max_conns` connections, then wait for their workers
    /// to finish and return
    pub fn serve_limited(&self, max_conns: usize) -> std::io::Result<()> {
        let mut workers = Vec::with_capacity(max_conns);
        for stream in self.listener.incoming().take(max_conns) {
            match stream {
                Ok(stream) => {
                    let manager = Arc::clone(&self.manager);
                    workers.push(thread::spawn(move || handle_client(manager, stream)));
                }
                Err(err) => log::warn!("fsd: accept failed: {}", err),
            }
        }
        for worker in workers {
            let _ = worker.join();
        }
        Ok(())
    }
}

fn handle_client(manager: Arc<Mutex<FsManager>>, stream: TcpStream) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(_) => String::from("unknown"),
    };
    log::info!("fsd: client connected: {}", peer);

    let reader = match stream.try_clone() {
        Ok(clone) => BufReader::new(clone),
        Err(err) => {
            log::warn!("fsd: failed to clone stream for {}: {}", peer, err);
            return;
        }
    };
    let mut writer = stream;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::warn!("fsd: read error from {}: {}", peer, err);
                break;
            }
        };
        log::debug!("fsd: {} -> {:?}", peer, line);

        let (reply, outcome) = match manager.lock() {
            Ok(mut fs) => proto::handle_line(&mut fs, &line),
            Err(poisoned) => {
                log::error!("fsd: file system lock poisoned: {}", poisoned);
                (String::from("ERROR: Internal server error."), Outcome::Disconnect)
            }
        };

        if let Err(err) = writeln!(writer, "{}", reply) {
            log::warn!("fsd: write error to {}: {}", peer, err);
            break;
        }
        if outcome == Outcome::Disconnect {
            break;
        }
    }

    log::info!("fsd: client disconnected: {}", peer);
}
