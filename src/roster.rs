//! Participant roster and author attribution.
//!
//! A roster lists the program's faculty and students together with the
//! citation styles their names appear in. Author tokens from a curriculum are
//! matched against it to count how many authors of an article belong to each
//! [`Category`].

use crate::config::{delimiter_byte, RosterTableConfig};
use crate::error::{Result, ScoreError};
use crate::tables::Table;
use crate::types::{Category, ParticipantCounts};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Connecting words skipped when building name variants.
const PARTICLES: [&str; 5] = ["de", "do", "da", "dos", "das"];

/// Faculty table columns used by [`Roster::build`].
pub const FACULTY_NAME_COLUMN: &str = "NOME";
pub const FACULTY_CATEGORY_COLUMN: &str = "CATEGORIA";

/// Lowercase and strip diacritics.
pub fn fold(text: &str) -> String {
    deunicode::deunicode(&text.to_lowercase())
}

fn is_particle(word: &str) -> bool {
    PARTICLES.contains(&word.to_lowercase().as_str())
}

/// Uppercase the first letter of every word and lowercase the rest.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// A name in the citation styles it is likely to appear in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameVariants {
    /// `Surname, I. I.`
    pub apa: String,
    /// `SURNAME, Given Names`
    pub abnt: String,
    /// `I. I. Surname`
    pub custom: String,
}

impl NameVariants {
    /// Derive the variants from a full name.
    ///
    /// The surname keeps the word before the last one unless that word is a
    /// particle, so "Neto" and "Filho" stay attached to the family name.
    pub fn from_full_name(full_name: &str) -> Self {
        let words: Vec<&str> = full_name.split_whitespace().collect();
        let Some((&last, rest)) = words.split_last() else {
            return Self::default();
        };

        let given: Vec<&str> = rest.iter().copied().filter(|w| !is_particle(w)).collect();
        let surname = match rest.last() {
            Some(previous) if !is_particle(previous) => format!("{} {}", previous, last),
            _ => last.to_string(),
        };
        let initials = given
            .iter()
            .filter_map(|w| w.chars().next())
            .map(|c| format!("{}.", c.to_uppercase()))
            .collect::<Vec<String>>()
            .join(" ");

        Self {
            apa: join_non_empty(&surname, ", ", &initials),
            abnt: join_non_empty(&surname.to_uppercase(), ", ", &title_case(&given.join(" "))),
            custom: join_non_empty(&initials, " ", &title_case(&surname)),
        }
    }
}

fn join_non_empty(left: &str, separator: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (false, false) => format!("{}{}{}", left, separator, right),
        (false, true) => left.to_string(),
        _ => right.to_string(),
    }
}

/// One roster member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub full_name: String,
    pub category: Category,
    pub variants: NameVariants,
    #[serde(skip)]
    folded: [String; 4],
}

impl Participant {
    pub fn new(full_name: impl Into<String>, category: Category, variants: NameVariants) -> Self {
        let full_name = full_name.into();
        let folded = [
            fold(&full_name),
            fold(&variants.apa),
            fold(&variants.abnt),
            fold(&variants.custom),
        ];
        Self {
            full_name,
            category,
            variants,
            folded,
        }
    }

    /// Participant whose variants are derived from the full name.
    pub fn from_full_name(full_name: impl Into<String>, category: Category) -> Self {
        let full_name = full_name.into();
        let variants = NameVariants::from_full_name(&full_name);
        Self::new(full_name, category, variants)
    }

    /// Folded full name followed by the folded variants.
    pub fn folded_forms(&self) -> &[String] {
        &self.folded
    }
}

/// An ordered list of participants. Order decides ties between matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    /// Read a roster table.
    ///
    /// Variant columns are optional. When one is missing every variant is
    /// derived from the full name.
    pub fn from_table(table: &Table, config: &RosterTableConfig) -> Result<Self> {
        let name_col = table.require_column(&config.full_name_column)?;
        let category_col = table.require_column(&config.category_column)?;
        let variant_columns = match (
            table.column(&config.apa_column),
            table.column(&config.abnt_column),
            table.column(&config.custom_column),
        ) {
            (Some(apa), Some(abnt), Some(custom)) => Some((apa, abnt, custom)),
            _ => None,
        };

        let participants = (0..table.len())
            .filter(|&row| !table.cell(row, name_col).trim().is_empty())
            .map(|row| {
                let full_name = table.cell(row, name_col).trim();
                let category = Category::from_code(table.cell(row, category_col));
                match variant_columns {
                    Some((apa, abnt, custom)) => Participant::new(
                        full_name,
                        category,
                        NameVariants {
                            apa: table.cell(row, apa).trim().to_string(),
                            abnt: table.cell(row, abnt).trim().to_string(),
                            custom: table.cell(row, custom).trim().to_string(),
                        },
                    ),
                    None => Participant::from_full_name(full_name, category),
                }
            })
            .collect();

        Ok(Self::new(participants))
    }

    /// Build a roster from a faculty table and a list of student names.
    ///
    /// Faculty whose `CATEGORIA` is "permanente" are permanent members, the
    /// rest collaborators. Rows missing a name or a category are skipped.
    pub fn build(faculty: &Table, students: &[String]) -> Result<Self> {
        let name_col = faculty.require_column(FACULTY_NAME_COLUMN)?;
        let category_col = faculty.require_column(FACULTY_CATEGORY_COLUMN)?;

        let mut participants = Vec::with_capacity(faculty.len() + students.len());
        for row in 0..faculty.len() {
            let full_name = faculty.cell(row, name_col).trim();
            let label = faculty.cell(row, category_col).trim();
            if full_name.is_empty() || label.is_empty() {
                continue;
            }
            let category = if label.eq_ignore_ascii_case("permanente") {
                Category::Permanent
            } else {
                Category::Collaborator
            };
            participants.push(Participant::from_full_name(full_name, category));
        }
        participants.extend(
            students
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| Participant::from_full_name(s, Category::Student)),
        );

        Ok(Self::new(participants))
    }

    /// Write the roster in the layout [`Roster::from_table`] reads.
    pub fn to_csv(&self, config: &RosterTableConfig) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter_byte(config.delimiter)?)
            .from_writer(Vec::new());

        writer.write_record([
            config.full_name_column.as_str(),
            config.category_column.as_str(),
            config.apa_column.as_str(),
            config.abnt_column.as_str(),
            config.custom_column.as_str(),
        ])?;
        for p in &self.participants {
            writer.write_record([
                p.full_name.as_str(),
                p.category.code(),
                p.variants.apa.as_str(),
                p.variants.abnt.as_str(),
                p.variants.custom.as_str(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ScoreError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

/// Decides which roster member, if any, an author token refers to.
pub trait AuthorMatcher: Send + Sync {
    fn find<'r>(&self, author: &str, roster: &'r Roster) -> Option<&'r Participant>;
}

/// Folded substring containment against the full name and every variant.
///
/// Short tokens can match several members and a co-author may be counted
/// more than once per article. The first member in roster order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentMatcher;

impl AuthorMatcher for ContainmentMatcher {
    fn find<'r>(&self, author: &str, roster: &'r Roster) -> Option<&'r Participant> {
        let token = fold(author.trim());
        if token.is_empty() {
            return None;
        }
        roster
            .participants
            .iter()
            .find(|p| p.folded_forms().iter().any(|form| form.contains(&token)))
    }
}

/// Count the roster members among a `;`-separated author list.
pub fn classify_authors(authors: &str, roster: &Roster, matcher: &dyn AuthorMatcher) -> ParticipantCounts {
    let mut counts = ParticipantCounts::default();
    for author in authors.split(';').map(str::trim).filter(|a| !a.is_empty()) {
        match matcher.find(author, roster) {
            Some(participant) => counts.record(participant.category),
            None => debug!(author, "Author not in roster"),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![
            Participant::from_full_name("João da Silva", Category::Permanent),
            Participant::from_full_name("Maria Souza", Category::Collaborator),
            Participant::from_full_name("Ana Lima", Category::Student),
        ])
    }

    #[test]
    fn test_variants_keep_compound_surname() {
        let v = NameVariants::from_full_name("Antonio Acacio de Melo Neto");
        assert_eq!(v.apa, "Melo Neto, A. A. M.");
        assert_eq!(v.abnt, "MELO NETO, Antonio Acacio Melo");
        assert_eq!(v.custom, "A. A. M. Melo Neto");
    }

    #[test]
    fn test_variants_particle_before_surname() {
        let v = NameVariants::from_full_name("João da Silva");
        assert_eq!(v.apa, "Silva, J.");
        assert_eq!(v.abnt, "SILVA, João");
        assert_eq!(v.custom, "J. Silva");
    }

    #[test]
    fn test_variants_degenerate_names() {
        assert_eq!(NameVariants::from_full_name("   "), NameVariants::default());
        let single = NameVariants::from_full_name("Pelé");
        assert_eq!(single.apa, "Pelé");
        assert_eq!(single.abnt, "PELÉ");
        assert_eq!(single.custom, "Pelé");
    }

    #[test]
    fn test_fold_strips_accents() {
        assert_eq!(fold("JOÃO Conceição"), "joao conceicao");
    }

    #[test]
    fn test_classify_counts_by_category() {
        let counts = classify_authors("Silva, J.; Souza, M.; LIMA, Ana; Someone Else", &roster(), &ContainmentMatcher);
        assert_eq!(counts.permanent, 1);
        assert_eq!(counts.collaborator, 1);
        assert_eq!(counts.student, 1);
    }

    #[test]
    fn test_classify_ignores_case_and_diacritics() {
        let counts = classify_authors("joao da silva", &roster(), &ContainmentMatcher);
        assert_eq!(counts.permanent, 1);
    }

    #[test]
    fn test_classify_skips_blank_tokens() {
        let counts = classify_authors(" ; ;", &roster(), &ContainmentMatcher);
        assert_eq!(counts, ParticipantCounts::default());
    }

    #[test]
    fn test_first_member_wins() {
        let roster = Roster::new(vec![
            Participant::from_full_name("Carlos Silva", Category::Collaborator),
            Participant::from_full_name("Carla Silva", Category::Permanent),
        ]);
        let counts = classify_authors("Silva", &roster, &ContainmentMatcher);
        assert_eq!(counts.collaborator, 1);
        assert_eq!(counts.permanent, 0);
    }

    #[test]
    fn test_two_word_name_keeps_both_words_as_surname() {
        let v = NameVariants::from_full_name("Ana Lima");
        assert_eq!(v.apa, "Ana Lima, A.");
        // "M. Souza" is not contained in any form of "Maria Souza".
        let counts = classify_authors("M. Souza", &roster(), &ContainmentMatcher);
        assert_eq!(counts.total(), 0);
        let counts = classify_authors("Souza, M.", &roster(), &ContainmentMatcher);
        assert_eq!(counts.collaborator, 1);
    }

    #[test]
    fn test_same_person_counted_per_token() {
        let counts = classify_authors("Silva, J.; J. Silva", &roster(), &ContainmentMatcher);
        assert_eq!(counts.permanent, 2);
    }

    #[test]
    fn test_from_table_uses_variant_columns() {
        let table = Table::read(
            "roster",
            "Nome Completo,Categoria,APA,ABNT,Custom\nJosé Pereira,DP,\"Pereira, J.\",\"PEREIRA, José\",J. Pereira\n,DC,,,\n".as_bytes(),
            b',',
        )
        .unwrap();
        let roster = Roster::from_table(&table, &RosterTableConfig::default()).unwrap();
        assert_eq!(roster.len(), 1);
        let p = &roster.participants()[0];
        assert_eq!(p.category, Category::Permanent);
        assert_eq!(p.variants.apa, "Pereira, J.");
    }

    #[test]
    fn test_from_table_derives_missing_variants() {
        let table = Table::read("roster", b"Nome Completo,Categoria\nAna Lima,DISC\n", b',').unwrap();
        let roster = Roster::from_table(&table, &RosterTableConfig::default()).unwrap();
        let variants = &roster.participants()[0].variants;
        assert_eq!(variants.apa, "Ana Lima, A.");
        assert_eq!(variants.abnt, "ANA LIMA, Ana");
        assert_eq!(variants.custom, "A. Ana Lima");
    }

    #[test]
    fn test_build_and_write_roster() {
        let faculty = Table::read(
            "faculty",
            b"NOME,CATEGORIA\nJoao da Silva,Permanente\nMaria Souza,Colaborador\nSem Categoria,\n",
            b',',
        )
        .unwrap();
        let roster = Roster::build(&faculty, &["Ana Lima".to_string(), " ".to_string()]).unwrap();
        let categories: Vec<Category> = roster.participants().iter().map(|p| p.category).collect();
        assert_eq!(
            categories,
            vec![Category::Permanent, Category::Collaborator, Category::Student]
        );

        let config = RosterTableConfig::default();
        let csv = roster.to_csv(&config).unwrap();
        assert!(csv.starts_with("Nome Completo,Categoria,APA,ABNT,Custom\n"));
        assert!(csv.contains("Ana Lima,DISC,\"Ana Lima, A.\",\"ANA LIMA, Ana\",A. Ana Lima\n"));

        let reread = Roster::from_table(&Table::read("roster", csv.as_bytes(), b',').unwrap(), &config).unwrap();
        assert_eq!(reread, roster);
    }
}
