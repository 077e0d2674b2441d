//! Composite import identifiers.
//!
//! Nested resources are imported with slash-separated identifiers such as
//! `datacenter_id/server_id` or `zone_id/record_id`; regional resources may
//! additionally carry a `location:` prefix (`de/fra:gateway_id/peer_id`
//! collapses to `location:gateway_id/peer_id` with the location opaque).

use crate::error::ProviderError;

/// Split a composite import id into exactly `N` non-empty parts.
///
/// `expected` documents the format in the error message, e.g.
/// `"datacenter_id/server_id"`.
pub fn parts<const N: usize>(id: &str, expected: &str) -> Result<[String; N], ProviderError> {
    let pieces: Vec<&str> = id.split('/').collect();
    if pieces.len() != N || pieces.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::InvalidRequest(format!(
            "invalid import id '{}', expected format {}",
            id, expected
        )));
    }
    let owned: Vec<String> = pieces.into_iter().map(str::to_string).collect();
    owned.try_into().map_err(|_| {
        ProviderError::Internal("import id split produced the wrong arity".to_string())
    })
}

/// Split off a `location:` prefix, returning `(location, remainder)`.
pub fn location_scoped<'a>(
    id: &'a str,
    expected: &str,
) -> Result<(&'a str, &'a str), ProviderError> {
    match id.split_once(':') {
        Some((location, rest)) if !location.is_empty() && !rest.is_empty() => {
            Ok((location, rest))
        }
        _ => Err(ProviderError::InvalidRequest(format!(
            "invalid import id '{}', expected format {}",
            id, expected
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_two() {
        let [dc, server] = parts::<2>("dc-1/srv-1", "datacenter_id/server_id").unwrap();
        assert_eq!(dc, "dc-1");
        assert_eq!(server, "srv-1");
    }

    #[test]
    fn test_parts_single() {
        let [id] = parts::<1>("zone-1", "zone_id").unwrap();
        assert_eq!(id, "zone-1");
    }

    #[test]
    fn test_parts_rejects_wrong_arity_and_empties() {
        let err = parts::<2>("dc-1", "datacenter_id/server_id").unwrap_err();
        assert!(err
            .to_string()
            .contains("expected format datacenter_id/server_id"));

        assert!(parts::<2>("dc-1/srv-1/extra", "datacenter_id/server_id").is_err());
        assert!(parts::<2>("dc-1/", "datacenter_id/server_id").is_err());
        assert!(parts::<2>("/srv-1", "datacenter_id/server_id").is_err());
    }

    #[test]
    fn test_location_scoped() {
        let (location, rest) =
            location_scoped("de-fra:gw-1/peer-1", "location:gateway_id/peer_id").unwrap();
        assert_eq!(location, "de-fra");

        let [gateway, peer] = parts::<2>(rest, "location:gateway_id/peer_id").unwrap();
        assert_eq!(gateway, "gw-1");
        assert_eq!(peer, "peer-1");
    }

    #[test]
    fn test_location_scoped_rejects_missing_prefix() {
        assert!(location_scoped("gw-1/peer-1", "location:gateway_id/peer_id").is_err());
        assert!(location_scoped(":gw-1/peer-1", "location:gateway_id/peer_id").is_err());
        assert!(location_scoped("de-fra:", "location:gateway_id/peer_id").is_err());
    }
}
