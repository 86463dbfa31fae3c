//! Thread building - turns an article into a numbered sequence of short posts

use crate::model::LiveArticle;

/// Characters kept free in every chunk for the ` [i/N]` marker
pub const MARKER_RESERVE: usize = 10;

/// Root post announcing the article, at most `max_chars` long unless the URL
/// alone is longer.
///
/// The description is shortened with an ellipsis first. When even an empty
/// description does not fit, it is left out and the title is shortened.
pub fn intro_post(title: &str, description: &str, url: &str, max_chars: usize) -> String {
    let post = format!("New article: {}\n\n({})\n\n{}", title, description, url);
    let overflow = post.chars().count().saturating_sub(max_chars);
    if overflow == 0 {
        return post;
    }

    let description_len = description.chars().count();
    if description_len > overflow {
        return format!(
            "New article: {}\n\n({})\n\n{}",
            title,
            shorten(description, description_len - overflow - 1),
            url
        );
    }

    let post = format!("New article: {}\n\n{}", title, url);
    let overflow = post.chars().count().saturating_sub(max_chars);
    if overflow == 0 {
        return post;
    }

    let keep = title.chars().count().saturating_sub(overflow + 1);
    format!("New article: {}\n\n{}", shorten(title, keep), url)
}

/// First `keep` characters followed by an ellipsis
fn shorten(text: &str, keep: usize) -> String {
    let kept: String = text.chars().take(keep).collect();
    format!("{}\u{2026}", kept.trim_end())
}

/// Split article text and links into a numbered thread whose posts fit in
/// `max_chars`
pub fn article_thread(article: &LiveArticle, max_chars: usize) -> Vec<String> {
    let limit = max_chars.saturating_sub(MARKER_RESERVE);
    let chunks = split_text(&article.text, limit);
    build_thread(chunks, &article.links, limit)
}

/// Append the reference chunks and number every chunk as ` [i/N]`.
///
/// Links are listed as `i: link` lines under a `References:` heading and
/// packed into as many chunks of at most `limit` characters as needed. A
/// single line longer than `limit` gets a chunk of its own.
pub fn build_thread(mut chunks: Vec<String>, links: &[String], limit: usize) -> Vec<String> {
    chunks.extend(reference_chunks(links, limit));

    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| format!("{} [{}/{}]", chunk, index + 1, total))
        .collect()
}

fn reference_chunks(links: &[String], limit: usize) -> Vec<String> {
    const HEADING: &str = "References:\n";

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for (index, link) in links.iter().enumerate() {
        let line = format!("{}: {}", index + 1, link);
        let line_len = line.chars().count();

        if current.is_empty() {
            if chunks.is_empty() {
                current.push_str(HEADING);
                current_len = HEADING.chars().count();
            }
        } else if current_len + 1 + line_len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(&line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Greedily pack words into chunks of at most `max_chars` characters,
/// keeping paragraph breaks when they fit. Words longer than a chunk are
/// hard-split.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunker = Chunker::new(max_chars.max(1));
    let normalized = text.replace("\r\n", "\n");

    for paragraph in normalized.split("\n\n") {
        for (index, word) in paragraph.split_whitespace().enumerate() {
            let separator = if index == 0 { "\n\n" } else { " " };
            chunker.push(word, separator);
        }
    }

    chunker.finish()
}

struct Chunker {
    max_chars: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl Chunker {
    fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    fn push(&mut self, word: &str, separator: &str) {
        let word_len = word.chars().count();

        if word_len > self.max_chars {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(self.max_chars) {
                let piece: String = piece.iter().collect();
                self.push(&piece, " ");
            }
            return;
        }

        let separator = if self.current.is_empty() { "" } else { separator };
        let separator_len = separator.chars().count();

        if self.current_len + separator_len + word_len > self.max_chars {
            self.flush();
            self.current.push_str(word);
            self.current_len = word_len;
            return;
        }

        self.current.push_str(separator);
        self.current.push_str(word);
        self.current_len += separator_len + word_len;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_thread_appends_references_and_markers() {
        let chunks = vec![
            "First part".to_string(),
            "Second part".to_string(),
            "Third part".to_string(),
        ];
        let links = vec![
            "https://example.org/a".to_string(),
            "https://other.example/b".to_string(),
        ];

        let thread = build_thread(chunks, &links, 270);

        assert_eq!(thread.len(), 4);
        assert_eq!(thread[0], "First part [1/4]");
        assert_eq!(thread[2], "Third part [3/4]");
        for (index, post) in thread.iter().enumerate() {
            assert!(post.ends_with(&format!("[{}/4]", index + 1)));
        }

        let references = &thread[3];
        assert!(references.starts_with("References:"));
        let first = references.find("1: https://example.org/a").unwrap();
        let second = references.find("2: https://other.example/b").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_many_links_spread_over_reference_posts() {
        let links: Vec<String> = (1..=12)
            .map(|i| format!("https://example.org/2020/some-referenced-post-{}", i))
            .collect();
        let article = LiveArticle {
            html: String::new(),
            text: "Some text here.".to_string(),
            links: links.clone(),
        };

        let thread = article_thread(&article, 280);

        assert!(thread.len() > 2);
        for post in &thread {
            assert!(post.chars().count() <= 280, "post too long: {post:?}");
        }
        assert!(thread[1].starts_with("References:\n\n1: "));

        let all = thread[1..].join("\n");
        let mut last = 0;
        for (index, link) in links.iter().enumerate() {
            let position = all.find(&format!("{}: {}", index + 1, link)).unwrap();
            assert!(position >= last);
            last = position;
        }
    }

    #[test]
    fn test_build_thread_without_links_has_no_references() {
        let thread = build_thread(vec!["Only".to_string()], &[], 270);
        assert_eq!(thread, vec!["Only [1/1]"]);
    }

    #[test]
    fn test_split_text_respects_limit() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = split_text(text, 15);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 15, "chunk too long: {chunk:?}");
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_split_text_keeps_paragraph_breaks() {
        let chunks = split_text("Hello there.\n\nSecond paragraph.", 100);
        assert_eq!(chunks, vec!["Hello there.\n\nSecond paragraph."]);
    }

    #[test]
    fn test_split_text_hard_splits_long_words() {
        let chunks = split_text("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_article_thread_fits_max_chars() {
        let article = LiveArticle {
            html: String::new(),
            text: "word ".repeat(200),
            links: vec!["https://example.org/ref".to_string()],
        };

        let thread = article_thread(&article, 80);

        assert!(thread.len() > 2);
        for post in &thread[..thread.len() - 1] {
            assert!(post.chars().count() <= 80, "post too long: {post:?}");
        }
        assert!(thread.last().unwrap().contains("1: https://example.org/ref"));
    }

    #[test]
    fn test_intro_post() {
        let post = intro_post("Title", "A description", "https://example.org/title", 280);
        assert_eq!(
            post,
            "New article: Title\n\n(A description)\n\nhttps://example.org/title"
        );
    }

    #[test]
    fn test_intro_post_shortens_long_title() {
        let title = "T".repeat(300);
        let post = intro_post(&title, "A description", "https://example.org/title", 280);

        assert_eq!(post.chars().count(), 280);
        assert!(post.starts_with("New article: TTT"));
        assert!(post.ends_with("T\u{2026}\n\nhttps://example.org/title"));
        assert!(!post.contains("A description"));
    }

    #[test]
    fn test_intro_post_shortens_description() {
        let description = "x".repeat(400);
        let post = intro_post("Title", &description, "https://example.org/title", 280);

        assert_eq!(post.chars().count(), 280);
        assert!(post.ends_with("\u{2026})\n\nhttps://example.org/title"));
    }
}
