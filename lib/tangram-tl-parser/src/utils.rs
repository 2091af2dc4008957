// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Free-standing utility functions for signature normalization and
//! identifier inference.

use crc32fast::Hasher;

/// Normalizes a textual definition into the canonical signature used
/// to compute its identifier.
///
/// The normalization drops the trailing semicolon and any `#hexid`
/// attached to the name, removes curly brackets (keeping the generic
/// definitions they wrap), turns angle brackets into spaces, collapses
/// whitespace, rewrites `bytes` parameter types as `string`, and strips
/// `flags.N?true` parameters entirely.
pub fn normalize_signature(definition: &str) -> String {
    let definition = definition.trim().trim_end_matches(';');

    // Drop `#hexid` from the head (name) token only. `#` also appears
    // as the flags type later on, which must be left alone.
    let mut representation = match definition.split_once(char::is_whitespace) {
        Some((head, rest)) => {
            let head = head.split('#').next().unwrap();
            format!("{} {}", head, rest)
        }
        None => definition.split('#').next().unwrap().to_string(),
    };

    representation = representation
        .replace(['<', '>'], " ")
        .replace(['{', '}'], "");
    representation = representation
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    representation = representation
        .replace(":bytes", ":string")
        .replace("?bytes", "?string");

    // Remove r" \w+:flags\.\d+\?true" parameters.
    while let Some(pos) = representation.find("?true") {
        let space = representation[..pos].rfind(' ').unwrap_or(0);
        representation.replace_range(space..pos + "?true".len(), "");
    }

    representation
}

/// Infers the identifier for a definition as the CRC32 checksum of its
/// normalized signature.
pub fn infer_id(definition: &str) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(normalize_signature(definition).as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_normalize() {
        assert_eq!(
            normalize_signature("msgs_ack#62d6b459 msg_ids:Vector<long> = MsgsAck;"),
            "msgs_ack msg_ids:Vector long = MsgsAck"
        );
        assert_eq!(
            normalize_signature("sendEncrypted\n    peer:InputEncryptedChat\n    data:bytes\n  = messages.SentEncryptedMessage"),
            "sendEncrypted peer:InputEncryptedChat data:string = messages.SentEncryptedMessage"
        );
    }

    #[test]
    fn check_infer_id() {
        // Note the parameter *named* `bytes`, which must be kept.
        let def = "rpc_answer_dropped msg_id:long seq_no:int bytes:int = RpcDropAnswer";
        assert_eq!(infer_id(def), 0xa43ad8b7);

        // Note the use of angle brackets.
        let def = "msgs_ack msg_ids:Vector<long> = MsgsAck";
        assert_eq!(infer_id(def), 0x62d6b459);

        // Note the use of curly brackets.
        let def = "invokeAfterMsg {X:Type} msg_id:long query:!X = X";
        assert_eq!(infer_id(def), 0xcb9f372d);

        // Note the use of `true` flags.
        let def = "inputMessagesFilterPhoneCalls flags:# missed:flags.0?true = MessagesFilter";
        assert_eq!(infer_id(def), 0x80c99768);
    }

    #[test]
    fn check_infer_id_ignores_declared() {
        // The declared identifier never participates in the checksum.
        let with_id = "msgs_ack#62d6b459 msg_ids:Vector<long> = MsgsAck;";
        let without_id = "msgs_ack msg_ids:Vector<long> = MsgsAck";
        assert_eq!(infer_id(with_id), infer_id(without_id));
    }
}
