use blockwrap_docker::DockerClient;

pub async fn doctor() -> anyhow::Result<()> {
    let settings = super::load_settings()?;

    let client = DockerClient::new(&settings.docker);
    let report = client.doctor().await;

    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed, see above for details");
    }

    Ok(())
}
