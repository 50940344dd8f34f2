//! CSV 出力

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::error::ScraperError;
use crate::record::{escape_title, RatingRecord};

pub const CSV_HEADER: &str = "Title,Year,Rating";

/// `<username>_ratings.csv`
pub fn ratings_file_name(username: &str) -> String {
    format!("{}_ratings.csv", username)
}

/// レコードを CSV テキストに変換（ヘッダー行 + 出現順の1行1レコード）
pub fn render_csv(records: &[RatingRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for record in records {
        // String への書き込みは失敗しない
        let _ = writeln!(
            out,
            "{},{},{}",
            escape_title(&record.title),
            record.year,
            record.rating
        );
    }

    out
}

/// CSV ファイルを書き出してパスを返す
///
/// 同じディレクトリの一時ファイルに書いてから rename で置き換えるため、
/// 同一ユーザーへの同時書き込みでも読み手が途中状態を見ることはない。
pub fn write_ratings_csv(
    dir: &Path,
    username: &str,
    records: &[RatingRecord],
) -> Result<PathBuf, ScraperError> {
    std::fs::create_dir_all(dir)?;

    let file_name = ratings_file_name(username);
    let path = dir.join(&file_name);
    let tmp_path = dir.join(temp_file_name(&file_name));

    std::fs::write(&tmp_path, render_csv(records))?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    info!("Wrote {} ratings to {:?}", records.len(), path);
    Ok(path)
}

/// `.<file_name>.tmp-<pid>-<seq>`（書き込みごとに一意）
fn temp_file_name(file_name: &str) -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    format!(
        ".{}.tmp-{}-{}",
        file_name,
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}
