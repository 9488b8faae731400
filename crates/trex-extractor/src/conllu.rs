//! CoNLL-U reader
//!
//! Turns annotator output in CoNLL-U format into one [`AnnotatedDocument`].
//! Sentences are concatenated; heads are rewritten to document-global
//! indices and a HEAD of `0` becomes a self-referential root.

use trex_core::{AnnotatedDocument, PosTag, Result, Token, TrexError};

const COLUMNS: usize = 10;

/// Parse a CoNLL-U document.
///
/// Multi-word token ranges (`3-4`) and empty nodes (`5.1`) are skipped.
pub fn parse_document(input: &str) -> Result<AnnotatedDocument> {
    let mut tokens = Vec::new();
    let mut sentence: Vec<Row<'_>> = Vec::new();

    for (line_no, line) in input.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            flush_sentence(&mut sentence, &mut tokens)?;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        if let Some(row) = parse_row(line, line_no)? {
            if row.id != sentence.len() + 1 {
                return Err(invalid(
                    line_no,
                    format!("expected token id {}, found {}", sentence.len() + 1, row.id),
                ));
            }
            sentence.push(row);
        }
    }
    flush_sentence(&mut sentence, &mut tokens)?;

    AnnotatedDocument::new(tokens)
}

struct Row<'a> {
    line_no: usize,
    id: usize,
    form: &'a str,
    upos: &'a str,
    head: usize,
    deprel: &'a str,
}

fn parse_row(line: &str, line_no: usize) -> Result<Option<Row<'_>>> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != COLUMNS {
        return Err(invalid(
            line_no,
            format!("expected {} columns, found {}", COLUMNS, columns.len()),
        ));
    }

    let id = columns[0];
    if id.contains('-') || id.contains('.') {
        return Ok(None);
    }

    let id = id
        .parse()
        .map_err(|_| invalid(line_no, format!("invalid token id '{}'", id)))?;
    let head = columns[6]
        .parse()
        .map_err(|_| invalid(line_no, format!("invalid head '{}'", columns[6])))?;

    Ok(Some(Row {
        line_no,
        id,
        form: columns[1],
        upos: columns[3],
        head,
        deprel: columns[7],
    }))
}

fn flush_sentence(sentence: &mut Vec<Row<'_>>, tokens: &mut Vec<Token>) -> Result<()> {
    let offset = tokens.len();
    let len = sentence.len();

    for row in sentence.drain(..) {
        let index = offset + row.id - 1;
        let head_index = match row.head {
            0 => index,
            h if h <= len => offset + h - 1,
            h => {
                return Err(invalid(
                    row.line_no,
                    format!("head {} outside sentence of {} tokens", h, len),
                ))
            }
        };

        tokens.push(Token::new(
            index,
            row.form,
            PosTag::parse(row.upos),
            row.deprel,
            head_index,
        ));
    }

    Ok(())
}

fn invalid(line_no: usize, message: String) -> TrexError {
    TrexError::InvalidDocument(format!("line {}: {}", line_no, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sent_id = 1
# text = Ginsburg wrote opinions.
1\tGinsburg\tGinsburg\tPROPN\tNNP\t_\t2\tnsubj\t_\t_
2\twrote\twrite\tVERB\tVBD\t_\t0\tROOT\t_\t_
3\topinions\topinion\tNOUN\tNNS\t_\t2\tdobj\t_\t_
4\t.\t.\tPUNCT\t.\t_\t2\tpunct\t_\t_

# sent_id = 2
1\tShe\tshe\tPRON\tPRP\t_\t2\tnsubj\t_\t_
2\tdied\tdie\tVERB\tVBD\t_\t0\tROOT\t_\t_
";

    #[test]
    fn test_parse_two_sentences() {
        let doc = parse_document(SAMPLE).unwrap();
        assert_eq!(doc.len(), 6);

        assert_eq!(doc[0].text, "Ginsburg");
        assert_eq!(doc[0].pos_tag, PosTag::Propn);
        assert_eq!(doc[0].head_index, 1);
        assert!(doc[1].is_root());

        // second sentence is offset
        assert_eq!(doc[4].head_index, 5);
        assert!(doc[5].is_root());
        assert_eq!(doc[5].dep_label, "ROOT");
    }

    #[test]
    fn test_skips_multiword_ranges() {
        let input = "\
1-2\tdel\t_\t_\t_\t_\t_\t_\t_\t_
1\tde\tde\tADP\t_\t_\t2\tcase\t_\t_
2\tel\tel\tDET\t_\t_\t0\troot\t_\t_
";
        let doc = parse_document(input).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc[0].pos_tag, PosTag::Adp);
    }

    #[test]
    fn test_wrong_column_count() {
        let err = parse_document("1\tGinsburg\tPROPN\n").unwrap_err();
        assert!(matches!(err, TrexError::InvalidDocument(ref m) if m.starts_with("line 1")));
    }

    #[test]
    fn test_head_outside_sentence() {
        let input = "1\tParis\tParis\tPROPN\t_\t_\t3\tnsubj\t_\t_\n";
        assert!(matches!(
            parse_document(input),
            Err(TrexError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            parse_document("# only a comment\n"),
            Err(TrexError::InvalidDocument(_))
        ));
    }
}
