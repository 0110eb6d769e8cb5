use env_logger::{Builder, Env};
use jigsaw_puzzle_slicer::{build_from_file, load_from_directory};
use std::env;

fn main() {
    Builder::from_env(Env::default().default_filter_or("debug"))
        .format_timestamp_millis()
        .init();
    let image_path = env::args()
        .nth(1)
        .unwrap_or("assets/images/raw.jpg".to_string());
    let piece_size = env::args()
        .nth(2)
        .and_then(|size| size.parse().ok())
        .unwrap_or(100);

    let puzzle = build_from_file(&image_path, piece_size).expect("Failed to slice image");
    puzzle
        .write_to_directory("pieces")
        .expect("Failed to write pieces");

    let reloaded = load_from_directory("pieces").expect("Failed to reload pieces");
    assert_eq!(reloaded.len(), puzzle.len());
}
