fn main() -> anyhow::Result<()> {
    kyc_wizard::run()
}
