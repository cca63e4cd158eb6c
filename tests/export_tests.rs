//! Integration tests for cover, text and book export.

mod common;

use assert_fs::prelude::*;
use predicates::prelude::*;

use common::{jpeg, MobiBuilder};
use mobimeta::export::{book, cover, text};
use mobimeta::MobiContainer;

fn book_with_cover() -> MobiBuilder {
    MobiBuilder {
        full_name: b"Cover Story".to_vec(),
        exth: Some(vec![
            (100, b"Jane Doe".to_vec()),
            (201, 0u32.to_be_bytes().to_vec()),
        ]),
        image_records: vec![jpeg(9)],
        ..Default::default()
    }
}

#[test]
fn test_export_cover_into_directory() {
    let temp = assert_fs::TempDir::new().unwrap();
    let c = MobiContainer::read_meta_data(&book_with_cover().build()).unwrap();

    let path = cover::export_cover(&c, temp.path()).unwrap();
    assert_eq!(path, temp.child("Cover_Story.jpg").path());
    temp.child("Cover_Story.jpg").assert(predicate::path::is_file());
    assert_eq!(std::fs::read(&path).unwrap(), jpeg(9));
}

#[test]
fn test_export_cover_adds_extension() {
    let temp = assert_fs::TempDir::new().unwrap();
    let c = MobiContainer::read_meta_data(&book_with_cover().build()).unwrap();

    cover::export_cover(&c, temp.child("front").path()).unwrap();
    temp.child("front.jpg").assert(predicate::path::exists());
}

#[test]
fn test_export_cover_without_images_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let c = MobiContainer::read_meta_data(&MobiBuilder::default().build()).unwrap();

    let err = cover::export_cover(&c, temp.path()).unwrap_err();
    assert!(err.to_string().contains("No cover"));
    temp.child("Test_Book.jpg").assert(predicate::path::missing());
}

#[test]
fn test_export_text_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let c = MobiContainer::read_meta_data(&book_with_cover().build()).unwrap();

    let out = temp.child("story.txt");
    text::export_text(&c, out.path()).unwrap();
    out.assert(predicate::str::contains("Title:   Cover Story"))
        .assert(predicate::str::contains("Author:  Jane Doe"))
        .assert(predicate::str::contains("Hello, world!"));
}

#[test]
fn test_save_book_refuses_input_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("book.mobi");
    input.write_binary(&MobiBuilder::default().build()).unwrap();

    let mut c = MobiContainer::open(input.path()).unwrap();
    let err = book::save_book(&mut c, input.path(), true, true).unwrap_err();
    assert!(err.to_string().contains("input file"));
}

#[test]
fn test_save_book_respects_overwrite() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("book.mobi");
    input.write_binary(&MobiBuilder::default().build()).unwrap();
    let output = temp.child("book_new.mobi");
    output.write_str("placeholder").unwrap();

    let mut c = MobiContainer::open(input.path()).unwrap();
    c.set_full_name("Edited").unwrap();
    assert!(book::save_book(&mut c, output.path(), true, false).is_err());
    output.assert("placeholder");

    book::save_book(&mut c, output.path(), true, true).unwrap();
    let reread = MobiContainer::open(output.path()).unwrap();
    assert_eq!(reread.full_name(), "Edited");
}
