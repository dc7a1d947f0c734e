use dialnet::dns::{GaiResolver, Hints, Query, Resolve};
use dialnet::{ConnectJob, ConnectOptions};
use std::error::Error;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let dump = match args.iter().position(|a| a == "--dump") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };
    let Some(host) = args.first().cloned() else {
        eprintln!("usage: fetch <host> [service] [--dump]");
        std::process::exit(2);
    };
    let service = args.get(1).cloned().unwrap_or_else(|| "http".to_string());

    // 1. Show what the resolver returns
    if dump {
        let hints = Hints {
            canonical_name: true,
            ..Hints::default()
        };
        let query = Query::new(host.as_str(), service.as_str()).with_hints(hints);
        let candidates = GaiResolver::new().resolve(&query)?;
        print!("{}", candidates.dump());
    }

    // 2. Connect
    let options = ConnectOptions::new()
        .total_timeout(Duration::from_secs(30))
        .nonblocking(true);
    let mut job = ConnectJob::with_options(GaiResolver::new(), options);
    let mut conn = job.connect(&host, &service)?;
    eprintln!("Connected to {}", conn.endpoint());

    // 3. Send one request line
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", host);
    conn.write_all(request.as_bytes())?;

    // 4. Dump the reply until the peer closes
    let mut stdout = io::stdout().lock();
    let mut buf = [0u8; 1024];
    while conn.is_connected() {
        let n = conn.read_available(&mut buf)?;
        if n == 0 {
            if conn.is_connected() {
                thread::sleep(Duration::from_millis(200));
            }
            continue;
        }
        stdout.write_all(&buf[..n])?;
    }
    stdout.flush()?;

    conn.disconnect()?;
    Ok(())
}
