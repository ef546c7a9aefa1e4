//! Minimal HTTP/1.1 server for cases httpmock cannot script: chunked bodies
//! without `Content-Length`, and responses that stall mid-body.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Behavior {
    /// 200 OK, `Transfer-Encoding: chunked`, body sent in `chunk_size` pieces.
    Chunked { body: Vec<u8>, chunk_size: usize },
    /// 200 OK with a `Content-Length`, sends `sent` bytes and then goes silent.
    Stall { declared: usize, sent: Vec<u8> },
}

/// Starts a server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(behavior: Behavior) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let behavior = behavior.clone();
            thread::spawn(move || handle(stream, &behavior));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, behavior: &Behavior) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }

    match behavior {
        Behavior::Chunked { body, chunk_size } => {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/xml\r\n\
Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            if stream.write_all(head.as_bytes()).is_err() {
                return;
            }
            for chunk in body.chunks((*chunk_size).max(1)) {
                let frame = format!("{:x}\r\n", chunk.len());
                if stream.write_all(frame.as_bytes()).is_err()
                    || stream.write_all(chunk).is_err()
                    || stream.write_all(b"\r\n").is_err()
                {
                    return;
                }
                let _ = stream.flush();
            }
            let _ = stream.write_all(b"0\r\n\r\n");
        }
        Behavior::Stall { declared, sent } => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/xml\r\nContent-Length: {}\r\n\r\n",
                declared
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(sent);
            let _ = stream.flush();
            thread::sleep(Duration::from_secs(10));
        }
    }
}
