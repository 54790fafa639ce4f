//! Sentence-aware re-segmentation of streamed text
//!
//! Chat completions arrive token by token; the synthesis backend wants text
//! in speakable units. The chunker re-partitions the fragment stream at
//! punctuation and whitespace so no sentence or word is split mid-way.

/// Characters that end a speakable chunk
const BREAK_CHARS: [char; 14] = [
    '.', ',', '?', '!', ';', ':', '—', '-', '(', ')', '[', ']', '}', ' ',
];

/// Re-segments a stream of text fragments into break-aligned chunks
///
/// Purely synchronous and scoped to a single utterance. Every emitted chunk
/// is non-empty and ends with one injected trailing space; stripping that
/// space from each chunk reproduces the fragment stream verbatim.
#[derive(Debug, Default)]
pub struct SentenceChunker {
    buffer: String,
}

impl SentenceChunker {
    /// Create a chunker for one utterance
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one fragment, emitting at most one chunk
    ///
    /// Break detection is based on the buffer state *before* the fragment is
    /// appended: a chunk is emitted when the buffered text already ends on a
    /// break character, or when the incoming fragment starts with one. Empty
    /// fragments are ignored.
    pub fn process(&mut self, fragment: &str) -> Option<String> {
        if fragment.is_empty() {
            return None;
        }

        if self.buffer.chars().next_back().is_some_and(is_break) {
            let mut chunk = std::mem::replace(&mut self.buffer, fragment.to_string());
            chunk.push(' ');
            return Some(chunk);
        }

        let first = fragment.chars().next()?;
        if is_break(first) {
            let mut chunk = std::mem::take(&mut self.buffer);
            chunk.push(first);
            chunk.push(' ');
            self.buffer = fragment[first.len_utf8()..].to_string();
            return Some(chunk);
        }

        self.buffer.push_str(fragment);
        None
    }

    /// Flush any buffered text once the fragment source is exhausted
    ///
    /// Emits the remainder as a final chunk even if it ends mid-word;
    /// returns `None` when nothing is buffered.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut chunk = std::mem::take(&mut self.buffer);
        chunk.push(' ');
        Some(chunk)
    }

    /// Text currently buffered, awaiting a break character
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Whether a character ends a speakable chunk
fn is_break(c: char) -> bool {
    BREAK_CHARS.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed fragments through a fresh chunker, returning all chunks
    fn chunk_all(fragments: &[&str]) -> Vec<String> {
        let mut chunker = SentenceChunker::new();
        let mut chunks: Vec<String> = fragments
            .iter()
            .filter_map(|f| chunker.process(f))
            .collect();
        if let Some(last) = chunker.flush() {
            chunks.push(last);
        }
        chunks
    }

    #[test]
    fn test_worked_example() {
        let mut chunker = SentenceChunker::new();

        assert_eq!(chunker.process("Hello"), None);
        // " world." starts with a space, so the buffered "Hello" is cut
        assert_eq!(chunker.process(" world.").as_deref(), Some("Hello  "));
        assert_eq!(chunker.pending(), "world.");
        // buffer now ends with '.', so the next fragment triggers emission
        assert_eq!(chunker.process("Next").as_deref(), Some("world. "));
        assert_eq!(chunker.flush().as_deref(), Some("Next "));
        assert_eq!(chunker.flush(), None);
    }

    #[test]
    fn test_empty_fragments_are_ignored() {
        let mut chunker = SentenceChunker::new();
        assert_eq!(chunker.process(""), None);
        assert_eq!(chunker.process("Hi."), None);
        assert_eq!(chunker.process(""), None);
        // the empty fragment must not have consumed the pending break
        assert_eq!(chunker.process("Bye").as_deref(), Some("Hi. "));
    }

    #[test]
    fn test_flush_only_when_nonempty() {
        let mut chunker = SentenceChunker::new();
        assert_eq!(chunker.flush(), None);

        chunker.process("word");
        assert_eq!(chunker.flush().as_deref(), Some("word "));
        assert_eq!(chunker.flush(), None);
    }

    #[test]
    fn test_never_emits_empty_chunk() {
        let fragments = [".", "a", ",", " ", "b", "!", "", "c"];
        for chunk in chunk_all(&fragments) {
            assert!(!chunk.is_empty());
            assert!(chunk.ends_with(' '));
        }
    }

    #[test]
    fn test_at_most_one_chunk_per_fragment() {
        let mut chunker = SentenceChunker::new();
        // each call returns Option, so 0-or-1 holds by construction; make
        // sure a fragment that is all break characters still emits just once
        assert_eq!(chunker.process("abc"), None);
        assert_eq!(chunker.process("...").as_deref(), Some("abc. "));
        assert_eq!(chunker.pending(), "..");
        // buffer now ends with a break, which wins over the fragment start
        assert_eq!(chunker.process("!?").as_deref(), Some(".. "));
        assert_eq!(chunker.pending(), "!?");
    }

    #[test]
    fn test_round_trip_reconstruction() {
        let fragments = ["The quick", " brown", " fox, jumps", ".", " Over—", "the lazy dog"];
        let source: String = fragments.concat();

        let mut chunker = SentenceChunker::new();
        let mut rebuilt = String::new();
        for fragment in fragments {
            if let Some(chunk) = chunker.process(fragment) {
                rebuilt.push_str(chunk.strip_suffix(' ').unwrap());
            }
        }
        if let Some(chunk) = chunker.flush() {
            rebuilt.push_str(chunk.strip_suffix(' ').unwrap());
        }

        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_multibyte_break_character() {
        let mut chunker = SentenceChunker::new();
        chunker.process("wait");
        // em-dash is in the break set and is multi-byte in UTF-8
        let chunk = chunker.process("—and then");
        assert_eq!(chunk.as_deref(), Some("wait— "));
        assert_eq!(chunker.pending(), "and then");
    }

    #[test]
    fn test_single_character_fragments() {
        // the lone space fragment becomes a space-only chunk: the break
        // space itself plus the injected trailing space
        let chunks = chunk_all(&["H", "i", ".", " ", "y", "o"]);
        assert_eq!(chunks, vec!["Hi. ", "  ", "yo "]);
    }
}
