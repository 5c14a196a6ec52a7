use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pagesim::run(pagesim::Args::parse())
}
