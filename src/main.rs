fn main() -> anyhow::Result<()> {
    heartopia_lib::run()
}
