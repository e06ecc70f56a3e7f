// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of cachedoc.
//
// cachedoc is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// cachedoc is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with cachedoc. If not, see <https://www.gnu.org/licenses/>.

//! Value codecs.
//!
//! Stored values are opaque bytes to the backend; a [`Codec`] turns any
//! serde-serializable value into those bytes and back. The store is generic
//! over its codec, so the format is chosen once per store.

use crate::{KVError, KVResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode/decode capability for stored values.
pub trait Codec: Send + Sync + Clone + 'static {
    /// Short codec name for logs.
    fn name(&self) -> &'static str;

    /// Serialize `value` into opaque bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> KVResult<Vec<u8>>;

    /// Deserialize bytes produced by [`Codec::encode`].
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> KVResult<T>;
}

/// Compact binary codec (bincode). Default for stores.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> KVResult<Vec<u8>> {
        bincode::serialize(value).map_err(|e| KVError::SerializationError(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> KVResult<T> {
        bincode::deserialize(bytes).map_err(|e| KVError::DeserializationError(e.to_string()))
    }
}

/// JSON codec, for collections that are also read by other tools.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> KVResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| KVError::SerializationError(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> KVResult<T> {
        serde_json::from_slice(bytes).map_err(|e| KVError::DeserializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Session {
        user_id: u64,
        roles: Vec<String>,
        flash: Option<String>,
    }

    fn sample() -> Session {
        Session {
            user_id: 42,
            roles: vec!["admin".to_string()],
            flash: None,
        }
    }

    #[test]
    fn test_bincode_preserves_struct() {
        let codec = BincodeCodec;
        let bytes = codec.encode(&sample()).unwrap();
        assert_eq!(codec.decode::<Session>(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_json_is_readable() {
        let codec = JsonCodec;
        let bytes = codec.encode(&sample()).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"user_id\":42"));
        assert_eq!(codec.decode::<Session>(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_empty_value_is_not_absent() {
        let codec = BincodeCodec;
        let bytes = codec.encode("").unwrap();
        assert_eq!(codec.decode::<String>(&bytes).unwrap(), "");
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = JsonCodec.decode::<Session>(b"not json").unwrap_err();
        assert!(matches!(err, KVError::DeserializationError(_)));

        let err = BincodeCodec.decode::<HashMap<String, String>>(&[0xff]).unwrap_err();
        assert!(matches!(err, KVError::DeserializationError(_)));
    }

    #[test]
    fn test_json_rejects_non_string_map_keys() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1u8);
        let err = JsonCodec.encode(&map).unwrap_err();
        assert!(matches!(err, KVError::SerializationError(_)));
    }
}
