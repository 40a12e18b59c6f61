fn main() -> anyhow::Result<()> {
    akpack::cli::run_cli()
}
