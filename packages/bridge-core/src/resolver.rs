//! Stream URL Resolver — turns a track identifier into a time-limited,
//! signed direct-audio URL via the cloud's two-step fetch-and-sign protocol.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde_json::Value;

use crate::config::Config;
use crate::error::{BridgeError, BridgeResult};
use crate::transport::CloudTransport;

/// Resolves a playable, signed URL for a track id.
///
/// # Errors
/// Returns [`BridgeError::Resolve`] if the download-info list is empty, the
/// chosen variant has no `downloadInfoUrl`, or the signing XML is missing
/// any of `host`/`path`/`ts`/`s`.
pub async fn resolve_stream_url(
    transport: &CloudTransport,
    track_id: &str,
) -> BridgeResult<String> {
    let payload = transport
        .request_json(
            reqwest::Method::GET,
            &format!("/tracks/{track_id}/download-info"),
            None,
            &[],
        )
        .await?;

    let variants = payload
        .get("result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if variants.is_empty() {
        return Err(BridgeError::Resolve(format!(
            "no download info for track {track_id}"
        )));
    }

    let chosen = variants
        .iter()
        .find(|v| v.get("codec").and_then(Value::as_str) == Some("mp3"))
        .or_else(|| variants.first())
        .ok_or_else(|| BridgeError::Resolve(format!("unexpected download info shape for track {track_id}")))?;

    let download_info_url = chosen
        .get("downloadInfoUrl")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BridgeError::Resolve(format!("downloadInfoUrl missing for track {track_id}")))?;

    let xml_text = transport
        .http_client()
        .get(download_info_url)
        .send()
        .await
        .map_err(BridgeError::TransportRequest)?
        .error_for_status()
        .map_err(BridgeError::TransportRequest)?
        .text()
        .await
        .map_err(BridgeError::TransportRequest)?;

    let fields = parse_signing_fields(&xml_text)?;

    let sign_src = format!(
        "{}{}{}",
        Config::SIGN_SALT,
        &fields.path[1.min(fields.path.len())..],
        fields.secret
    );
    let sign = format!("{:x}", md5::compute(sign_src.as_bytes()));

    Ok(format!(
        "https://{}/get-mp3/{}/{}{}",
        fields.host, sign, fields.ts, fields.path
    ))
}

struct SigningFields {
    host: String,
    path: String,
    ts: String,
    secret: String,
}

/// Parses the `<host>`, `<path>`, `<ts>`, `<s>` leaf elements out of the
/// download-info signing XML. Any missing element is treated identically to
/// malformed XML: a [`BridgeError::Resolve`].
fn parse_signing_fields(xml: &str) -> BridgeResult<SigningFields> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut host = None;
    let mut path = None;
    let mut ts = None;
    let mut secret = None;
    let mut current_tag: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                current_tag = Some(String::from_utf8_lossy(e.name().as_ref()).to_string());
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current_tag.as_deref() {
                    Some("host") => host = Some(text),
                    Some("path") => path = Some(text),
                    Some("ts") => ts = Some(text),
                    Some("s") => secret = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current_tag = None,
            Ok(Event::Eof) => break,
            Err(err) => return Err(BridgeError::Xml(err)),
            _ => {}
        }
        buf.clear();
    }

    match (host, path, ts, secret) {
        (Some(host), Some(path), Some(ts), Some(secret))
            if !host.is_empty() && !path.is_empty() && !ts.is_empty() && !secret.is_empty() =>
        {
            Ok(SigningFields { host, path, ts, secret })
        }
        _ => Err(BridgeError::Resolve(
            "downloadInfo XML missing required fields".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_url_per_reference_recipe() {
        let xml = "<download-info><host>s1.storage</host><path>/get/a.mp3</path><ts>1700000000</ts><s>sec</s></download-info>";
        let fields = parse_signing_fields(xml).unwrap();
        assert_eq!(fields.host, "s1.storage");

        let sign_src = format!("{}{}{}", Config::SIGN_SALT, &fields.path[1..], fields.secret);
        let sign = format!("{:x}", md5::compute(sign_src.as_bytes()));
        let url = format!("https://{}/get-mp3/{}/{}{}", fields.host, sign, fields.ts, fields.path);

        assert_eq!(
            url,
            format!(
                "https://s1.storage/get-mp3/{:x}/1700000000/get/a.mp3",
                md5::compute(b"XGRlBW9FXlekgbPrRHuSiAget/a.mp3sec")
            )
        );
    }

    #[test]
    fn missing_field_is_resolve_error() {
        let xml = "<download-info><host>s1.storage</host><path>/get/a.mp3</path></download-info>";
        let err = parse_signing_fields(xml).unwrap_err();
        assert!(matches!(err, BridgeError::Resolve(_)));
    }
}
