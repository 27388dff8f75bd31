//! 端到端测试：真实 TCP 连接上的控制消息与遥测流

use armctl_bridge::{Bridge, BridgeConfig};
use armctl_sdk::ArmBuilder;
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        Self {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }

    fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).unwrap();
        self.writer.write_all(b"\n").unwrap();
    }

    fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        serde_json::from_str(&line).unwrap()
    }

    /// 跳过遥测消息，返回下一条回复
    fn reply(&mut self) -> Value {
        loop {
            let message = self.recv();
            if message["type"] != "telemetry" {
                return message;
            }
        }
    }
}

#[test]
fn test_control_and_telemetry_over_tcp() {
    let arm = Arc::new(
        ArmBuilder::new()
            .without_transport()
            .telemetry_period(Duration::from_millis(10))
            .build(),
    );
    let bridge = Arc::new(Bridge::new(
        arm,
        BridgeConfig {
            listen: "127.0.0.1:0".to_string(),
            poll_interval: Duration::from_millis(5),
            ..BridgeConfig::default()
        },
    ));
    let listener = bridge.bind().unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Arc::new(AtomicBool::new(false));
    let server = {
        let bridge = Arc::clone(&bridge);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || bridge.serve(listener, &shutdown))
    };

    let mut client = Client::connect(addr);
    let greeting = client.recv();
    assert_eq!(greeting["type"], "connected");
    assert_eq!(greeting["control_mode"], "simulation");

    client.send(r#"{"action":"ping"}"#);
    assert_eq!(client.reply()["type"], "pong");

    client.send("not json");
    assert_eq!(client.reply()["type"], "error");

    client.send(r#"{"action":"move_to_angles","angles":[0,0,0,0,0,0]}"#);
    let result = client.reply();
    assert_eq!(result["type"], "dispatch_result");
    assert_eq!(result["source"], "websocket");
    assert_eq!(result["serial_sent"], false);

    client.send(r#"{"action":"subscribe"}"#);
    let first = client.recv();
    assert_eq!(first["type"], "telemetry_snapshot");
    let next = client.recv();
    assert_eq!(next["type"], "telemetry");
    assert_eq!(next["data"]["raw"], "mock");

    shutdown.store(true, Ordering::Release);
    server.join().unwrap().unwrap();

    // 连接已被服务端关闭：读到剩余消息后 EOF
    let mut rest = String::new();
    loop {
        rest.clear();
        match client.reader.read_line(&mut rest) {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}
