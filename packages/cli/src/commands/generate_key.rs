use console::style;
use registry_server::crypto::AesGcmSecretProvider;

pub fn run() -> anyhow::Result<()> {
    let key = AesGcmSecretProvider::generate_key();
    println!("{}", key);
    eprintln!();
    eprintln!(
        "{} Store it as {} or under {} in config/config.toml.",
        style("hint:").cyan().bold(),
        style("REGISTRY__SECRETS__ENCRYPTION_KEY").bold(),
        style("[secrets] encryption_key").bold(),
    );
    eprintln!(
        "{} Changing the key makes every stored SSH key unreadable.",
        style("warning:").yellow().bold(),
    );
    Ok(())
}
