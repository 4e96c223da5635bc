use std::process;
use anyhow::{Error, Result};
use clap::{load_yaml, App, ArgMatches};
use tokio::runtime::Runtime;
use netkit::{cmd, trace};

fn main() {
    let ver  = env!("CARGO_PKG_VERSION");
    let yaml = load_yaml!("args.yml");
    let args = App::from_yaml(&yaml).version(ver).get_matches();

    run(&args).unwrap_or_else(abort);
}

fn run(args: &ArgMatches) -> Result<()> {
    trace::setup(module_path!(), args.occurrences_of("verbose"))?;

    let runtime = Runtime::new()?;

    match args.subcommand() {
        ("serve", Some(args)) => runtime.block_on(cmd::serve(args)),
        ("get",   Some(args)) => runtime.block_on(cmd::get(args)),
        ("echo",  Some(args)) => runtime.block_on(cmd::echo(args)),
        _                     => unreachable!(),
    }
}

fn abort(e: Error) {
    match e.downcast_ref::<clap::Error>() {
        Some(e) => println!("{}", e.message),
        None    => panic!("{:?}", e),
    }
    process::exit(1);
}
