//! Text chunking for size-limited remote APIs
//!
//! Translation and TTS services cap request sizes, so long text is split
//! into chunks that each fit within a caller-supplied limit, preferring
//! sentence boundaries and falling back to word boundaries.

/// Split `text` into chunks that each fit within `max_chars` bytes.
///
/// Sentences (runs of `.`/`!`/`?` followed by whitespace) are accumulated
/// greedily with a single-space separator. A sentence that alone exceeds
/// the limit is wrapped at word boundaries; only its final wrapped piece
/// keeps accumulating with the sentences that follow. Joining the chunks
/// with single spaces reproduces the whitespace-normalized input.
///
/// Returns an empty vector for empty or whitespace-only input, or when
/// `max_chars` is 0. Every returned chunk is non-empty.
#[must_use]
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let needed = if current.is_empty() {
            sentence.len()
        } else {
            current.len() + 1 + sentence.len()
        };

        if needed <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        } else if sentence.len() <= max_chars {
            // Flush the accumulated chunk, start fresh with this sentence
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(sentence);
        } else {
            // Single sentence exceeds the limit: wrap at word boundaries.
            // All wrapped pieces except the last are emitted directly; the
            // last piece continues accumulating with subsequent sentences.
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let mut pieces = wrap_words(sentence, max_chars);
            if let Some(last) = pieces.pop() {
                chunks.extend(pieces);
                current.push_str(&last);
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split text into sentences on runs of `.`, `!`, or `?` followed by
/// whitespace. The punctuation stays attached to the preceding sentence;
/// the separating whitespace is consumed.
fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?') {
            // Consume the full punctuation run ("..." or "?!")
            let mut end = i + 1;
            while end < bytes.len() && matches!(bytes[end], b'.' | b'!' | b'?') {
                end += 1;
            }

            if end < bytes.len() && bytes[end].is_ascii_whitespace() {
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                // Skip the whitespace run separating the sentences
                let mut next = end;
                while next < bytes.len() && bytes[next].is_ascii_whitespace() {
                    next += 1;
                }
                start = next;
                i = next;
                continue;
            }

            i = end;
        } else {
            i += 1;
        }
    }

    if start < text.len() {
        let sentence = text[start..].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
    }

    sentences
}

/// Wrap a single sentence into pieces of at most `max_chars` bytes,
/// breaking only at word boundaries.
///
/// A word that alone exceeds `max_chars` is cut at the nearest `char`
/// boundary at or below the limit, so the size bound holds even for
/// pathological input.
fn wrap_words(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in sentence.split_whitespace() {
        if word.len() > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            let mut rest = word;
            while rest.len() > max_chars {
                let mut cut = max_chars;
                while cut > 0 && !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                if cut == 0 {
                    // A single char wider than the limit; emit it whole
                    break;
                }
                pieces.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            current.push_str(rest);
            continue;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current.len() + 1 + word.len()
        };

        if needed <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            pieces.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}
