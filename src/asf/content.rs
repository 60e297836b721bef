//! Reading and editing the descriptive strings of an ASF header.

use super::objects::{AsfValue, ContentDescription, ExtendedContentDescription, ObjectHeader};
use super::{Asf, AsfRecord, guids};
use crate::error::{Error, Result};
use crate::ids::Guid;
use crate::node::{NodeId, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentField {
    Title,
    Author,
    Copyright,
    Description,
    Rating,
}

impl ContentField {
    fn of(self, cd: &ContentDescription) -> &String {
        match self {
            ContentField::Title => &cd.title,
            ContentField::Author => &cd.author,
            ContentField::Copyright => &cd.copyright,
            ContentField::Description => &cd.description,
            ContentField::Rating => &cd.rating,
        }
    }

    fn of_mut(self, cd: &mut ContentDescription) -> &mut String {
        match self {
            ContentField::Title => &mut cd.title,
            ContentField::Author => &mut cd.author,
            ContentField::Copyright => &mut cd.copyright,
            ContentField::Description => &mut cd.description,
            ContentField::Rating => &mut cd.rating,
        }
    }
}

fn header(tree: &Tree<Asf>) -> Result<NodeId> {
    tree.top()
        .first(&guids::HEADER)
        .ok_or_else(|| Error::NotFound("ASF header object".into()))
}

fn find(tree: &Tree<Asf>, guid: &Guid) -> Option<NodeId> {
    let h = header(tree).ok()?;
    tree.node(h).children()?.first(guid)
}

/// The child object of the header, created from `empty` when missing.
fn find_or_add(tree: &mut Tree<Asf>, guid: Guid, empty: AsfRecord) -> Result<NodeId> {
    if let Some(id) = find(tree, &guid) {
        return Ok(id);
    }
    let h = header(tree)?;
    tree.add_leaf(Some(h), ObjectHeader::new(guid), empty)
}

pub fn content_field(tree: &Tree<Asf>, field: ContentField) -> Option<String> {
    let id = find(tree, &guids::CONTENT_DESCRIPTION)?;
    match tree.node(id).record() {
        AsfRecord::ContentDescription(cd) => Some(field.of(cd).clone()),
        _ => None,
    }
}

/// Sets one of the five content description strings, adding the object to
/// the header if it has none. Returns the object's node.
pub fn set_content_field(tree: &mut Tree<Asf>, field: ContentField, value: &str) -> Result<NodeId> {
    let id = find_or_add(
        tree,
        guids::CONTENT_DESCRIPTION,
        AsfRecord::ContentDescription(ContentDescription::default()),
    )?;
    match tree.record_mut(id) {
        AsfRecord::ContentDescription(cd) => {
            *field.of_mut(cd) = value.to_string();
            Ok(id)
        }
        _ => Err(Error::layout("content description object is not decodable")),
    }
}

/// A string attribute such as `WM/AlbumTitle` from the extended content description.
pub fn extended_text(tree: &Tree<Asf>, name: &str) -> Option<String> {
    let id = find(tree, &guids::EXTENDED_CONTENT_DESCRIPTION)?;
    match tree.node(id).record() {
        AsfRecord::ExtendedContentDescription(ecd) => ecd.get(name)?.as_text().map(str::to_string),
        _ => None,
    }
}

pub fn set_extended_text(tree: &mut Tree<Asf>, name: &str, value: &str) -> Result<NodeId> {
    let id = find_or_add(
        tree,
        guids::EXTENDED_CONTENT_DESCRIPTION,
        AsfRecord::ExtendedContentDescription(ExtendedContentDescription::default()),
    )?;
    match tree.record_mut(id) {
        AsfRecord::ExtendedContentDescription(ecd) => {
            ecd.set(name, AsfValue::Unicode(value.to_string()));
            Ok(id)
        }
        _ => Err(Error::layout("extended content description object is not decodable")),
    }
}
