//! Mark normalization
//!
//! The editor may split a formatting run when bold and italic are toggled over
//! overlapping selections, producing `<em>A</em><strong><em>B</em></strong><em>C</em>`.
//! Writing that as-is adds mark boundaries on every save. The inline tree is
//! flattened to runs of (marks, leaf) and re-nested so each mark spans as many
//! consecutive runs as possible: `<em>A<strong>B</strong>C</em>`.

use super::Inline;

#[derive(Debug, Clone, PartialEq)]
enum Mark {
    /// `occurrence` keeps separate links apart even when they share a target.
    Link {
        occurrence: usize,
        href: String,
        title: Option<String>,
    },
    Strong,
    Emphasis,
    Strike,
}

impl Mark {
    /// Tie-break order when two marks span the same runs; lower is outer.
    fn rank(&self) -> u8 {
        match self {
            Mark::Link { .. } => 0,
            Mark::Strong => 1,
            Mark::Emphasis => 2,
            Mark::Strike => 3,
        }
    }

    fn wrap(&self, content: Vec<Inline>) -> Inline {
        match self {
            Mark::Link { href, title, .. } => Inline::Link {
                href: href.clone(),
                title: title.clone(),
                content,
            },
            Mark::Strong => Inline::Strong { content },
            Mark::Emphasis => Inline::Emphasis { content },
            Mark::Strike => Inline::Strike { content },
        }
    }
}

#[derive(Debug, Clone)]
struct Run {
    marks: Vec<Mark>,
    leaf: Inline,
}

/// Merge split and improperly nested marks.
pub fn normalize_marks(inlines: &[Inline]) -> Vec<Inline> {
    let mut runs = Vec::new();
    flatten(inlines, &mut Vec::new(), &mut runs, &mut 0);
    let runs = merge_text(runs);
    nest(&runs)
}

fn flatten(inlines: &[Inline], marks: &mut Vec<Mark>, runs: &mut Vec<Run>, links: &mut usize) {
    for inline in inlines {
        let mark = match inline {
            Inline::Strong { .. } => Some(Mark::Strong),
            Inline::Emphasis { .. } => Some(Mark::Emphasis),
            Inline::Strike { .. } => Some(Mark::Strike),
            Inline::Link { href, title, .. } => {
                *links += 1;
                Some(Mark::Link {
                    occurrence: *links,
                    href: href.clone(),
                    title: title.clone(),
                })
            }
            _ => None,
        };
        match (mark, inline) {
            (
                Some(mark),
                Inline::Strong { content }
                | Inline::Emphasis { content }
                | Inline::Strike { content }
                | Inline::Link { content, .. },
            ) => {
                let pushed = !marks.contains(&mark);
                if pushed {
                    marks.push(mark);
                }
                flatten(content, marks, runs, links);
                if pushed {
                    marks.pop();
                }
            }
            (_, Inline::Shortcode(node)) => {
                let mut node = node.clone();
                node.content = normalize_marks(&node.content);
                runs.push(Run {
                    marks: marks.clone(),
                    leaf: Inline::Shortcode(node),
                });
            }
            (_, leaf) => runs.push(Run {
                marks: marks.clone(),
                leaf: leaf.clone(),
            }),
        }
    }
}

fn same_marks(a: &[Mark], b: &[Mark]) -> bool {
    a.len() == b.len() && a.iter().all(|m| b.contains(m))
}

fn merge_text(runs: Vec<Run>) -> Vec<Run> {
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs {
        if let Inline::Text { text } = &run.leaf {
            if text.is_empty() {
                continue;
            }
            if let Some(Run {
                marks,
                leaf: Inline::Text { text: previous },
            }) = merged.last_mut()
            {
                if same_marks(marks, &run.marks) {
                    previous.push_str(text);
                    continue;
                }
            }
        }
        merged.push(run);
    }
    merged
}

fn nest(runs: &[Run]) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut index = 0;
    while index < runs.len() {
        let run = &runs[index];
        let best = run
            .marks
            .iter()
            .map(|mark| (span(runs, index, mark), mark))
            .max_by(|(len_a, a), (len_b, b)| len_a.cmp(len_b).then(b.rank().cmp(&a.rank())));
        let Some((len, mark)) = best else {
            out.push(run.leaf.clone());
            index += 1;
            continue;
        };
        let inner: Vec<Run> = runs[index..index + len]
            .iter()
            .map(|r| Run {
                marks: r.marks.iter().filter(|m| *m != mark).cloned().collect(),
                leaf: r.leaf.clone(),
            })
            .collect();
        out.push(mark.wrap(nest(&inner)));
        index += len;
    }
    out
}

fn span(runs: &[Run], start: usize, mark: &Mark) -> usize {
    runs[start..]
        .iter()
        .take_while(|run| run.marks.contains(mark))
        .count()
}
