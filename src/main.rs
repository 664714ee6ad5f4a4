fn main() -> anyhow::Result<()> {
    notekeep::ui::io::run()?;
    Ok(())
}
