use super::*;
use crate::document::model::TextStyle;

fn text(s: &str) -> Block {
    Block::Text {
        text: s.to_owned(),
        style: TextStyle::Normal,
    }
}

fn bullets(items: &[&str]) -> Block {
    Block::Bullets {
        items: items.iter().map(|s| (*s).to_owned()).collect(),
    }
}

#[test]
fn tags_map_case_insensitively() {
    assert_eq!(Layout::from_tag(Some("title-slide")), Layout::TitleSlide);
    assert_eq!(Layout::from_tag(Some("Two-Column")), Layout::TwoColumn);
    assert_eq!(
        Layout::from_tag(Some("TITLE-AND-CONTENT")),
        Layout::TitleAndContent
    );
}

#[test]
fn unknown_or_absent_tag_is_default() {
    assert_eq!(Layout::from_tag(Some("carousel")), Layout::Default);
    assert_eq!(Layout::from_tag(Some("")), Layout::Default);
    assert_eq!(Layout::from_tag(None), Layout::Default);
}

#[test]
fn tag_round_trips_through_from_tag() {
    for l in [
        Layout::Default,
        Layout::TitleSlide,
        Layout::TwoColumn,
        Layout::TitleAndContent,
    ] {
        assert_eq!(Layout::from_tag(Some(l.tag())), l);
    }
}

#[test]
fn only_title_slide_hides_the_title_bar() {
    assert!(!Layout::TitleSlide.shows_title_bar());
    assert!(Layout::Default.shows_title_bar());
    assert!(Layout::TwoColumn.shows_title_bar());
}

#[test]
fn two_column_puts_the_extra_block_on_the_left() {
    let blocks = vec![text("a"), text("b"), text("c")];
    let cols = Layout::TwoColumn.columns(&blocks);
    assert_eq!(cols.len(), 2);
    assert_eq!(cols[0], vec![&blocks[0], &blocks[1]]);
    assert_eq!(cols[1], vec![&blocks[2]]);

    let empty = Layout::TwoColumn.columns(&[]);
    assert!(empty.iter().all(Vec::is_empty));
}

#[test]
fn title_and_content_moves_text_first_stably() {
    let blocks = vec![bullets(&["x"]), text("first"), bullets(&["y"]), text("second")];
    let cols = Layout::TitleAndContent.columns(&blocks);
    assert_eq!(
        cols,
        vec![vec![&blocks[1], &blocks[3], &blocks[0], &blocks[2]]]
    );
}
