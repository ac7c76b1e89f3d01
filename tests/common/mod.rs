#![allow(dead_code)]

pub mod resources {
    use parking_lot::Mutex;
    use restdispatch::context::Context;
    use restdispatch::resource::{ParamSpec, RestResource};
    use serde_json::json;

    /// `user.profile`: records every hook call in order.
    #[derive(Default)]
    pub struct Profile {
        calls: Mutex<Vec<String>>,
    }

    impl Profile {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn count(&self, hook: &str) -> usize {
            self.calls.lock().iter().filter(|c| *c == hook).count()
        }

        fn record(&self, hook: &str) {
            self.calls.lock().push(hook.to_string());
        }
    }

    impl RestResource for Profile {
        fn resource(&self) -> &str {
            "user.profile"
        }

        fn prepare(&self, _ctx: &mut Context) {
            self.record("prepare");
        }

        fn get(&self, ctx: &mut Context) {
            self.record("GET");
            let id = ctx.request.param("id").unwrap_or("anonymous").to_string();
            ctx.response.json(200, &json!({ "id": id }));
        }

        fn put(&self, ctx: &mut Context) {
            self.record("PUT");
            ctx.response.text(200, "updated");
        }

        fn post(&self, ctx: &mut Context) {
            self.record("POST");
            let name = ctx.request.param("name").unwrap_or_default().to_string();
            ctx.response.json(201, &json!({ "created": name }));
        }

        fn delete(&self, ctx: &mut Context) {
            self.record("DELETE");
            ctx.response.set_status(204);
        }
    }

    /// `item.search`: `GET` requires `q` and an optional integer `page`.
    #[derive(Default)]
    pub struct Search {
        calls: Mutex<Vec<String>>,
    }

    impl Search {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl RestResource for Search {
        fn resource(&self) -> &str {
            "item.search"
        }

        fn parameters(&self) -> ParamSpec {
            ParamSpec::new().method("GET", &["q", "?page:int"])
        }

        fn prepare(&self, _ctx: &mut Context) {
            self.calls.lock().push("prepare".into());
        }

        fn get(&self, ctx: &mut Context) {
            self.calls.lock().push("GET".into());
            ctx.response.text(200, "results");
        }
    }

    /// `ops.boom`: writes a partial response with a header, then panics in `get`.
    pub struct Boom;

    impl RestResource for Boom {
        fn resource(&self) -> &str {
            "ops.boom"
        }

        fn get(&self, ctx: &mut Context) {
            ctx.response.header("Cache-Control: max-age=600");
            ctx.response.text(200, "partial");
            panic!("boom");
        }
    }

    /// `user.account`: headers from `prepare`, computed `Location` on `post`.
    pub struct Account;

    impl RestResource for Account {
        fn resource(&self) -> &str {
            "user.account"
        }

        fn prepare(&self, ctx: &mut Context) {
            ctx.response.header("Cache-Control: no-store");
        }

        fn get(&self, ctx: &mut Context) {
            ctx.response.json(200, &json!({ "ok": true }));
        }

        fn post(&self, ctx: &mut Context) {
            let id = ctx.request.param("id").unwrap_or("0").to_string();
            ctx.response.header(format!("Location: /user/{id}/"));
            ctx.response.json(201, &json!({ "id": id }));
        }
    }

    /// `ops.readonly`: implements only `get`.
    pub struct ReadOnly;

    impl RestResource for ReadOnly {
        fn resource(&self) -> &str {
            "ops.readonly"
        }

        fn get(&self, ctx: &mut Context) {
            ctx.response.text(200, "ro");
        }
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Parsed raw HTTP/1.1 response
    #[derive(Debug)]
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    /// Write `req` and read until the declared body length has arrived.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&tmp[..n]);
                    if is_complete(&buf) {
                        break;
                    }
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn is_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(n, _)| n.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= length
    }

    pub fn parse_response(resp: &str) -> RawResponse {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
            .collect();
        RawResponse {
            status,
            headers,
            body: body.to_string(),
        }
    }
}

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}
