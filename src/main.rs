use anyhow::Result;
use clap::{App, load_yaml};
use env_logger::Builder;
use log::info;
use log::LevelFilter::*;
use flowscope::watch::{clear, watch};

fn main() -> Result<()> {
    let yaml = load_yaml!("args.yml");
    let ver  = env!("CARGO_PKG_VERSION");
    let args = App::from_yaml(&yaml).version(ver).get_matches();

    let (module, level) = match args.occurrences_of("verbose") {
        0 => (Some(module_path!()), Info),
        1 => (Some(module_path!()), Debug),
        2 => (Some(module_path!()), Trace),
        _ => (None,                 Trace),
    };
    Builder::from_default_env().filter(module, level).filter(Some("catcher"), level).init();

    info!("initializing flowscope {}", ver);

    match args.subcommand() {
        ("watch", Some(args)) => watch(args),
        ("clear", Some(args)) => clear(args),
        _                     => unreachable!(),
    }
}
