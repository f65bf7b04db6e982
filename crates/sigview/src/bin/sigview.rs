//! SigView
//!
//! Usage:
//!   sigview
//!   sigview capture.sr
//!   sigview -d demo -D -l 4
//!   sigview -d loopback:conn=/dev/ttyUSB0 -c

use sigview::{HeadlessPlatform, Launcher};

fn main() {
    let code = Launcher::new(HeadlessPlatform::new()).run(std::env::args().skip(1));
    std::process::exit(code);
}
