use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_smithy_types::byte_stream::ByteStream;

use crate::error::StorageError;
use crate::store::{DocumentStore, Precondition, StoredObject};

const PRECONDITION_FAILED: u16 = 412;
const CONDITIONAL_CONFLICT: u16 = 409;
const NOT_FOUND: u16 = 404;

/// [`DocumentStore`] backed by a single S3 bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl DocumentStore for S3Store {
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        get_object(&self.client, &self.bucket, key).await
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        precondition: Precondition,
    ) -> Result<String, StorageError> {
        put_object(&self.client, &self.bucket, key, body, content_type, &precondition).await
    }

    async fn delete(&self, key: &str, precondition: Precondition) -> Result<(), StorageError> {
        delete_object(&self.client, &self.bucket, key, &precondition).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = list_objects(&self.client, &self.bucket, prefix).await?;
        keys.sort();
        Ok(keys)
    }
}

fn http_status<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|resp| resp.status().as_u16())
}

/// Get an object from S3, including its ETag.
pub async fn get_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<StoredObject, StorageError> {
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            let err = e.into_service_error();
            if err.is_no_such_key() {
                StorageError::NotFound {
                    key: key.to_string(),
                }
            } else {
                StorageError::GetObject(err.to_string())
            }
        })?;

    let etag = resp.e_tag().unwrap_or_default().to_string();
    let body = resp
        .body
        .collect()
        .await
        .map_err(|e| StorageError::GetObject(e.to_string()))?
        .into_bytes()
        .to_vec();

    Ok(StoredObject { body, etag })
}

/// Put an object to S3 under a precondition. Returns the new ETag.
///
/// `IfMatch` maps to the `If-Match` header and `IfAbsent` to
/// `If-None-Match: *`. S3 answers a lost race with 412, or 409 when two
/// conditional writes collide in flight; both surface as
/// `StorageError::PreconditionFailed`.
pub async fn put_object(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    content_type: Option<&str>,
    precondition: &Precondition,
) -> Result<String, StorageError> {
    let mut req = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body));

    if let Some(ct) = content_type {
        req = req.content_type(ct);
    }

    req = match precondition {
        Precondition::None => req,
        Precondition::IfMatch(etag) => req.if_match(etag),
        Precondition::IfAbsent => req.if_none_match("*"),
    };

    let resp = req.send().await.map_err(|e| {
        match http_status(&e) {
            Some(PRECONDITION_FAILED | CONDITIONAL_CONFLICT) => StorageError::PreconditionFailed {
                key: key.to_string(),
            },
            _ => StorageError::PutObject(e.into_service_error().to_string()),
        }
    })?;

    Ok(resp.e_tag().unwrap_or_default().to_string())
}

/// Delete an object from S3.
pub async fn delete_object(
    client: &Client,
    bucket: &str,
    key: &str,
    precondition: &Precondition,
) -> Result<(), StorageError> {
    let mut req = client.delete_object().bucket(bucket).key(key);

    match precondition {
        Precondition::None => {}
        Precondition::IfMatch(etag) => req = req.if_match(etag),
        // Nothing to delete; succeed only if there is indeed nothing there.
        Precondition::IfAbsent => {
            return match client.head_object().bucket(bucket).key(key).send().await {
                Ok(_) => Err(StorageError::PreconditionFailed {
                    key: key.to_string(),
                }),
                Err(e) => {
                    let err = e.into_service_error();
                    if err.is_not_found() {
                        Ok(())
                    } else {
                        Err(StorageError::DeleteObject(err.to_string()))
                    }
                }
            };
        }
    }

    req.send().await.map_err(|e| {
        match (http_status(&e), precondition) {
            (Some(PRECONDITION_FAILED), _) | (Some(NOT_FOUND), Precondition::IfMatch(_)) => {
                StorageError::PreconditionFailed {
                    key: key.to_string(),
                }
            }
            _ => StorageError::DeleteObject(e.into_service_error().to_string()),
        }
    })?;

    Ok(())
}

/// List objects under a prefix. Returns keys.
pub async fn list_objects(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, StorageError> {
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let mut req = client.list_objects_v2().bucket(bucket).prefix(prefix);

        if let Some(token) = &continuation_token {
            req = req.continuation_token(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StorageError::ListObjects(e.into_service_error().to_string()))?;

        for obj in resp.contents() {
            if let Some(key) = obj.key() {
                keys.push(key.to_string());
            }
        }

        if resp.is_truncated() == Some(true) {
            continuation_token = resp.next_continuation_token().map(|s| s.to_string());
        } else {
            break;
        }
    }

    Ok(keys)
}
