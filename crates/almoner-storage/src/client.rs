use aws_sdk_s3::Client;

/// Build an S3 client from the default AWS config chain.
///
/// `region` overrides the chain's region. `endpoint_url` points the client at
/// an S3-compatible service (MinIO, LocalStack) and switches to path-style
/// addressing, which those services expect.
pub async fn build_client(region: Option<&str>, endpoint_url: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }
    if let Some(url) = endpoint_url {
        loader = loader.endpoint_url(url);
    }
    let config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .force_path_style(endpoint_url.is_some())
        .build();
    Client::from_conf(s3_config)
}
