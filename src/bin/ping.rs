//! Ping demo: a request/response control loop over a pair of topics.
//!
//! The client publishes /ping/req and subscribes to /ping/rsp; the server
//! does the opposite. Both sides use condition-variable notifiers. At the
//! end the domain is dumped, the topology is printed as DOT and the drop
//! counters decide the exit code.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{App, Arg};

use vernet::{
    config, to_dot, CondvarNotifier, Domain, DomainInfo, Envelope, Filter, Notifier, Publisher,
    Subscriber, TypedMessage,
};

#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct PingPayload {
    seq0: u64,
    seq1: u64,
    seq2: u64,
    seq3: u64,
}

#[derive(Default)]
struct PingMsg {
    env: Envelope,
}

impl TypedMessage for PingMsg {
    const DATA_TYPE: &'static str = "vernet.demo.ping-msg";

    fn envelope(&self) -> &Envelope {
        &self.env
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        &mut self.env
    }
}

fn now_nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Server: pops requests, republishes them as responses
fn server_loop(domain: Arc<Domain>, qsize: usize, killed: Arc<AtomicBool>) -> u32 {
    let notifier = Arc::new(CondvarNotifier::new());
    let req_sub = Subscriber::<PingMsg>::new(
        &domain,
        "SERVER0",
        "/ping/req",
        qsize,
        Some(notifier.clone() as Arc<dyn Notifier>),
    )
    .expect("server subscribe failed");
    let rsp_pub =
        Publisher::<PingMsg>::new(&domain, "SERVER0", "/ping/rsp").expect("server publish failed");

    log::info!("server started");
    while !killed.load(Ordering::Relaxed) {
        let mut m = PingMsg::default();
        while req_sub.pop(&mut m) {
            rsp_pub.push(&mut m);
        }
        notifier.wait_for(config::DEFAULT_WAIT_TIMEOUT);
    }
    log::info!("server stopped");

    req_sub.queue().drop_count()
}

/// Client: publishes requests, pops responses and accumulates round trips
fn client_loop(
    domain: Arc<Domain>,
    qsize: usize,
    killed: Arc<AtomicBool>,
    round_trips: Arc<AtomicU64>,
) -> u32 {
    let notifier = Arc::new(CondvarNotifier::new());
    let req_pub =
        Publisher::<PingMsg>::new(&domain, "CLIENT0", "/ping/req").expect("client publish failed");
    let rsp_sub = Subscriber::<PingMsg>::new(
        &domain,
        "CLIENT0",
        "/ping/rsp",
        qsize,
        Some(notifier.clone() as Arc<dyn Notifier>),
    )
    .expect("client subscribe failed");

    log::info!("client started");
    while !killed.load(Ordering::Relaxed) {
        let mut m = PingMsg::default();
        m.env.timestamp = now_nanos();
        {
            let p = m.env.plain_as_mut::<PingPayload>();
            p.seq0 = 0x1234567890;
            p.seq1 = 0x0987654321;
            p.seq2 = 0x1a1a1a1a1a;
            p.seq3 = 0x7e7e7e7e7e;
        }
        req_pub.push(&mut m);

        notifier.wait_for(Duration::from_millis(100));

        while rsp_sub.pop(&mut m) {
            let rtt = now_nanos().saturating_sub(m.env.timestamp);
            log::info!("rsp seqno {} rtt {} nsec", m.env.seqno, rtt);
            round_trips.fetch_add(1, Ordering::Relaxed);
        }
    }
    log::info!("client stopped");

    rsp_sub.queue().drop_count()
}

fn main() {
    env_logger::init();

    let matches = App::new("vernet-ping")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Vernet ping demo: req/rsp control loop between two threads")
        .arg(
            Arg::with_name("duration")
                .short("d")
                .long("duration")
                .value_name("SECS")
                .help("Test duration in seconds")
                .takes_value(true)
                .default_value("1"),
        )
        .arg(
            Arg::with_name("qsize")
                .short("q")
                .long("qsize")
                .value_name("ENVELOPES")
                .help("Subscriber queue capacity")
                .takes_value(true)
                .default_value("16"),
        )
        .arg(
            Arg::with_name("dot")
                .long("dot")
                .help("Print the topology as a Graphviz digraph before exit"),
        )
        .get_matches();

    let duration: u64 = matches
        .value_of("duration")
        .unwrap()
        .parse()
        .expect("invalid --duration");
    let qsize: usize = matches
        .value_of("qsize")
        .unwrap()
        .parse()
        .expect("invalid --qsize");

    let domain = Arc::new(Domain::new("DEFAULT"));
    let killed = Arc::new(AtomicBool::new(false));
    let round_trips = Arc::new(AtomicU64::new(0));

    let server = {
        let domain = domain.clone();
        let killed = killed.clone();
        thread::spawn(move || server_loop(domain, qsize, killed))
    };

    // Give the server a moment to register before the client starts pushing
    thread::sleep(Duration::from_millis(10));

    let client = {
        let domain = domain.clone();
        let killed = killed.clone();
        let round_trips = round_trips.clone();
        thread::spawn(move || client_loop(domain, qsize, killed, round_trips))
    };

    let start = Instant::now();
    thread::sleep(Duration::from_secs(duration));

    killed.store(true, Ordering::Relaxed);
    domain.shutdown(Duration::from_millis(1), &Filter::any());

    let server_drops = server.join().expect("server thread panicked");
    let client_drops = client.join().expect("client thread panicked");

    domain.dump(&Filter::any());

    if matches.is_present("dot") {
        let mut info = DomainInfo::default();
        domain.query(&mut info, &Filter::any());
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        to_dot(&info, &mut out).expect("dot export failed");
        out.flush().ok();
    }

    println!(
        "{} round trips in {:?}, server drops {}, client drops {}",
        round_trips.load(Ordering::Relaxed),
        start.elapsed(),
        server_drops,
        client_drops
    );

    if server_drops != 0 || client_drops != 0 {
        std::process::exit(1);
    }
}
