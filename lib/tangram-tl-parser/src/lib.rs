// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! This library provides a parser for [Type Language] schema files.
//!
//! Beyond the bare declaration grammar, the parser understands the
//! constructs found in real schema files:
//!
//! * `---functions---` and `---types---` section separators;
//! * `===N===` layer markers;
//! * `//@key value` description directives, which attach to the next
//!   declaration (`//@description` for the declaration itself, any
//!   other key for the parameter of that name);
//! * declarations spanning multiple lines, accumulated until a `;`.
//!
//! Declarations that redeclare the primitive types (`int ? = Int;`,
//! `vector {t:Type} # [ t ] = Vector t;` and friends) are skipped
//! without error, as schema files routinely carry them for
//! documentation purposes.
//!
//! [Type Language]: https://core.telegram.org/mtproto/TL

pub mod errors;
pub mod tl;
mod utils;

use errors::ParseError;
use tl::{Category, Definition};
pub use utils::{infer_id, normalize_signature};

/// Type names whose redeclarations inside schema files are skipped:
/// the wire codec treats these as built-ins.
const PRIMITIVE_NAMES: [&str; 9] = [
    "int", "long", "double", "string", "bytes", "int128", "int256", "int512", "vector",
];

/// Description directives collected from `//@` lines, waiting for the
/// next declaration.
#[derive(Default)]
struct PendingDescriptions(Vec<(String, String)>);

impl PendingDescriptions {
    fn push_line(&mut self, line: &str) {
        // A single line may hold several `@key text` segments.
        for segment in line.trim_start_matches("//").split('@') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once(char::is_whitespace) {
                Some((key, text)) => self.0.push((key.into(), text.trim().into())),
                None => self.0.push((segment.into(), String::new())),
            }
        }
    }

    fn apply(&mut self, definition: &mut Definition) {
        for (key, text) in self.0.drain(..) {
            if key == "description" {
                definition.description = text;
            } else if let Some(param) =
                definition.params.iter_mut().find(|param| param.name == key)
            {
                param.description = text;
            }
        }
    }
}

/// Whether a declaration should be skipped without attempting to parse
/// it: primitive redeclarations and `name ? = Type` built-in markers.
fn skip_declaration(declaration: &str) -> bool {
    let head = declaration
        .split(|c: char| c.is_whitespace() || c == '#')
        .next()
        .unwrap_or("");
    if PRIMITIVE_NAMES.contains(&head) {
        return true;
    }
    match declaration.split_once('=') {
        Some((left, _)) => left.trim_end().ends_with('?'),
        None => false,
    }
}

/// Parses the layer number out of a `===N===` marker line, if the line
/// is one.
fn parse_layer_marker(line: &str) -> Option<i32> {
    if !line.starts_with("===") {
        return None;
    }
    line.trim_matches('=').trim().parse().ok()
}

/// Parses a file full of [Type Language] definitions.
///
/// Parse failures for individual definitions are reported in place,
/// letting the caller decide whether they are fatal.
///
/// # Examples
///
/// ```
/// use tangram_tl_parser::parse_tl_file;
///
/// let schema = "
/// boolTrue#997275b5 = Bool;
/// ---functions---
/// ping#7abe77ec ping_id:long = Pong;
/// ";
/// assert!(parse_tl_file(schema).into_iter().all(|def| def.is_ok()));
/// ```
///
/// [Type Language]: https://core.telegram.org/mtproto/TL
pub fn parse_tl_file(contents: &str) -> Vec<Result<Definition, ParseError>> {
    let mut results = Vec::new();
    let mut category = Category::Types;
    let mut layer = None;
    let mut pending = PendingDescriptions::default();
    let mut buffer = String::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("//@") {
            pending.push_line(line);
            continue;
        }
        if line.starts_with("//") {
            continue;
        }
        if let Some(marker) = parse_layer_marker(line) {
            layer = Some(marker);
            continue;
        }
        if line.starts_with("---") {
            match line {
                "---functions---" => category = Category::Functions,
                "---types---" => category = Category::Types,
                _ => results.push(Err(ParseError::UnknownSeparator)),
            }
            continue;
        }

        // Inline trailing comments are not part of the declaration.
        let line = match line.find("//") {
            Some(pos) => line[..pos].trim_end(),
            None => line,
        };
        if line.is_empty() {
            continue;
        }

        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(line);

        // A buffered declaration is complete once it carries `;`.
        // The remainder of the line may start the next one.
        while let Some(pos) = buffer.find(';') {
            let declaration: String = buffer.drain(..=pos).collect();
            let declaration = declaration.trim();
            if declaration == ";" || skip_declaration(declaration) {
                pending.0.clear();
                continue;
            }
            results.push(declaration.parse::<Definition>().map(|mut definition| {
                definition.category = category;
                definition.layer = layer;
                pending.apply(&mut definition);
                definition
            }));
            pending.0.clear();
        }
    }

    // A trailing declaration without `;` is still a declaration.
    let declaration = buffer.trim();
    if !declaration.is_empty() && !skip_declaration(declaration) {
        results.push(declaration.parse::<Definition>().map(|mut definition| {
            definition.category = category;
            definition.layer = layer;
            pending.apply(&mut definition);
            definition
        }));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bad_separator() {
        assert_eq!(
            parse_tl_file("---foo---"),
            vec![Err(ParseError::UnknownSeparator)]
        );
    }

    #[test]
    fn parse_file() {
        let result = parse_tl_file(
            "
            // comments start with a double slash
            first#1 = t; // inline trailing comment
            second#2 = t;
            // the following separator is unknown
            ---bad---
            third#3 = t;
            ---functions---
            fourth#4 = t;
            ---types---
            fifth#5 = t;
            ",
        );

        assert_eq!(result.len(), 6);
        assert_eq!(result[0].as_ref().unwrap().id, 1);
        assert_eq!(result[1].as_ref().unwrap().id, 2);
        assert!(result[2].is_err());
        assert_eq!(result[3].as_ref().unwrap().id, 3);
        let fourth = result[4].as_ref().unwrap();
        assert_eq!(fourth.id, 4);
        assert_eq!(fourth.category, Category::Functions);
        let fifth = result[5].as_ref().unwrap();
        assert_eq!(fifth.id, 5);
        assert_eq!(fifth.category, Category::Types);
    }

    #[test]
    fn parse_multiline_declarations() {
        let result = parse_tl_file(
            "
            first#1
                lol:String
            = t;
            second#2 = t; third#3 = t;
            ",
        );
        let ids: Vec<u32> = result.into_iter().map(|def| def.unwrap().id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn skip_primitive_redeclarations() {
        let result = parse_tl_file(
            "
            int ? = Int;
            long ? = Long;
            double ? = Double;
            string ? = String;
            vector {t:Type} # [ t ] = Vector t;
            int128 4*[ int ] = Int128;
            boolFalse#bc799737 = Bool;
            ",
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].as_ref().unwrap().name, "boolFalse");
    }

    #[test]
    fn parse_layer_markers() {
        let result = parse_tl_file(
            "
            before#1 = t;
            ===8===
            middle#2 = t;
            ===17===
            after#3 = t;
            ",
        );
        let layers: Vec<Option<i32>> =
            result.into_iter().map(|def| def.unwrap().layer).collect();
        assert_eq!(layers, [None, Some(8), Some(17)]);
    }

    #[test]
    fn parse_description_directives() {
        let result = parse_tl_file(
            "
            //@description Sends a message @chat_id Target chat @text The text
            sendText chat_id:long text:string = Ok;
            plain#7 = t;
            ",
        );
        let def = result[0].as_ref().unwrap();
        assert_eq!(def.description, "Sends a message");
        assert_eq!(def.params[0].description, "Target chat");
        assert_eq!(def.params[1].description, "The text");

        // Directives only attach to the declaration right after them.
        assert_eq!(result[1].as_ref().unwrap().description, "");
    }
}
