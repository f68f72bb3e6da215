use metlog_context::{
    ContextValue,
    config::Config,
    decorators::{Request, RequestInfo, apache_log},
    get_context, helper,
};
use serde::Serialize;

const CONFIG: &str = r"
[web]
enabled = true
sender_backend = stdout
logger = request_sync
";

#[derive(Debug, Serialize)]
struct Lookup {
    table: String,
    rows: usize,
}

fn try_init_logger() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;
    Ok(())
}

fn authenticate(request: &Request) {
    let user = if request.path().starts_with("/admin") {
        "root"
    } else {
        "alice"
    };
    get_context().insert("user", user);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    try_init_logger()?;

    let config = Config::parse(CONFIG)?;
    helper::global().configure(&config.section("web")?)?;
    log::info!("Configured request logging");

    let handler = apache_log(|request: &Request| {
        authenticate(request);

        let data = get_context();
        data.insert(
            "lookup",
            ContextValue::serde(Lookup {
                table: "users".to_owned(),
                rows: 3,
            }),
        );
        data.insert("cache", "miss");
        200_u16
    });

    for path in ["/index.html", "/admin/users"] {
        let status = handler(
            &Request::new(path)
                .with_host("example.com")
                .with_user_agent("request_sync/0.1"),
        )?;
        log::info!("Handled {path} with status {status}");
    }

    Ok(())
}
