fn main() -> anyhow::Result<()> {
    progression_cli::run()
}
