use criterion::{criterion_group, criterion_main, Criterion};
use restdispatch::context::{CapturedResponse, Context, IncomingRequest};
use restdispatch::dispatcher::{normalize_endpoint, Dispatcher};
use restdispatch::registry::ResourceRegistry;
use restdispatch::resource::{ParamSpec, RestResource};
use std::hint::black_box;
use std::sync::Arc;

struct Item {
    name: String,
}

impl RestResource for Item {
    fn resource(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> ParamSpec {
        ParamSpec::new().method("GET", &["?id:int"])
    }

    fn get(&self, ctx: &mut Context) {
        let id = ctx.request.param("id").unwrap_or("0").to_string();
        ctx.response.json(200, &serde_json::json!({ "id": id }));
    }

    fn post(&self, ctx: &mut Context) {
        ctx.response.text(201, "created");
    }
}

fn build_dispatcher() -> Dispatcher {
    let registry = Arc::new(ResourceRegistry::new());
    for group in ["zoo", "inventory", "user", "shop", "ops"] {
        for item in ["animals", "feeds", "profile", "orders", "health"] {
            registry
                .register(Arc::new(Item {
                    name: format!("{group}.{item}"),
                }))
                .expect("valid resource name");
        }
    }
    Dispatcher::new(registry)
}

fn bench_dispatch_throughput(c: &mut Criterion) {
    let dispatcher = build_dispatcher();
    let requests = [
        ("GET", "/zoo/animals/?id=123"),
        ("GET", "/user/profile"),
        ("POST", "/shop/orders/"),
        ("GET", "/ops/missing/"),
        ("PATCH", "/inventory/feeds/"),
    ];
    c.bench_function("dispatch_serve", |b| {
        let mut sink = CapturedResponse::default();
        b.iter(|| {
            for (method, uri) in requests.iter() {
                let record = dispatcher.serve(&IncomingRequest::new(method, uri), &mut sink);
                black_box(&record);
            }
        })
    });
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_endpoint", |b| {
        b.iter(|| {
            black_box(normalize_endpoint(black_box("/zoo/animals")));
            black_box(normalize_endpoint(black_box("/zoo/animals/")));
        })
    });
}

criterion_group!(benches, bench_dispatch_throughput, bench_normalize);
criterion_main!(benches);
