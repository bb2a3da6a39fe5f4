/// What a card and a detail overlay show for a record, independent of markup.
///
/// An absent optional field never yields a section, so renderers can emit a heading
/// for every section they receive.
use crate::model::ProtocolRecord;

/// Watermark text for cards of suspended studies.
pub const SUSPENDED_WATERMARK: &str = "SUSPENDU";

/// Placeholder for the missing half of a contact.
pub const MISSING_CONTACT_PART: &str = "—";

/// A tag on a protocol card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge<'a> {
    Randomized,
    Phase(&'a str),
    Blinding(&'static str),
    PrimaryEndpoint,
    Highlight(&'a str),
}

impl<'a> Badge<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Badge::Randomized => "Randomisée",
            Badge::Phase(phase) => *phase,
            Badge::Blinding(label) => *label,
            Badge::PrimaryEndpoint => "Endpoint primaire",
            Badge::Highlight(tag) => *tag,
        }
    }
}

pub fn card_badges(record: &ProtocolRecord) -> Vec<Badge<'_>> {
    let mut badges = Vec::new();
    if record.randomized {
        badges.push(Badge::Randomized);
    }
    if let Some(phase) = record.phase.as_deref() {
        badges.push(Badge::Phase(phase));
    }
    if let Some(blinding) = record.blinding {
        badges.push(Badge::Blinding(blinding.label()));
    }
    if !record.primary_endpoints.is_empty() {
        badges.push(Badge::PrimaryEndpoint);
    }
    badges.extend(record.highlights.iter().map(|h| Badge::Highlight(h.as_str())));
    badges
}

/// `Some` only for records whose recruitment is suspended.
pub fn watermark(record: &ProtocolRecord) -> Option<&'static str> {
    record.suspended.then_some(SUSPENDED_WATERMARK)
}

/// One block of the detail overlay, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSection<'a> {
    Schemas(&'a [String]),
    ProtocolDocument(&'a str),
    Contact { name: &'a str, phone: &'a str },
    Design(&'a str),
    Population(&'a str),
    PrimaryEndpoints(&'a [String]),
    SecondaryEndpoints(&'a [String]),
    Inclusion(&'a [String]),
    Exclusion(&'a [String]),
}

impl DetailSection<'_> {
    pub fn heading(&self) -> &'static str {
        match self {
            DetailSection::Schemas(_) => "Schéma de l’étude",
            DetailSection::ProtocolDocument(_) => "Protocole complet",
            DetailSection::Contact { .. } => "Infirmière responsable",
            DetailSection::Design(_) => "Devis",
            DetailSection::Population(_) => "Population",
            DetailSection::PrimaryEndpoints(_) => "Endpoint primaire",
            DetailSection::SecondaryEndpoints(_) => "Endpoints secondaires",
            DetailSection::Inclusion(_) => "Critères d’inclusion",
            DetailSection::Exclusion(_) => "Critères d’exclusion",
        }
    }
}

pub fn detail_sections(record: &ProtocolRecord) -> Vec<DetailSection<'_>> {
    let mut sections = Vec::new();
    if !record.schemas.is_empty() {
        sections.push(DetailSection::Schemas(&record.schemas));
    }
    if let Some(doc) = record.protocol_document.as_deref() {
        sections.push(DetailSection::ProtocolDocument(doc));
    }
    if let Some(contact) = &record.contact {
        sections.push(DetailSection::Contact {
            name: contact.name.as_deref().unwrap_or(MISSING_CONTACT_PART),
            phone: contact.phone.as_deref().unwrap_or(MISSING_CONTACT_PART),
        });
    }
    sections.push(DetailSection::Design(&record.design_full));
    sections.push(DetailSection::Population(&record.population));
    if !record.primary_endpoints.is_empty() {
        sections.push(DetailSection::PrimaryEndpoints(&record.primary_endpoints));
    }
    if !record.secondary_endpoints.is_empty() {
        sections.push(DetailSection::SecondaryEndpoints(&record.secondary_endpoints));
    }
    sections.push(DetailSection::Inclusion(&record.inclusion));
    if !record.exclusion.is_empty() {
        sections.push(DetailSection::Exclusion(&record.exclusion));
    }
    sections
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::catalogue::tests::record;
    use crate::catalogue::{Catalogue, StagePolicy};
    use crate::model::{Blinding, Cancer, Contact};

    fn headings(record: &ProtocolRecord) -> Vec<&'static str> {
        detail_sections(record).iter().map(|s| s.heading()).collect()
    }

    #[test]
    fn minimal_record_shows_required_sections_only() {
        let r = record("min", Cancer::Kidney, "Localisé", "Minimal");
        assert_eq!(
            headings(&r),
            vec!["Devis", "Population", "Critères d’inclusion"]
        );
    }

    #[test]
    fn full_record_shows_every_section_in_order() {
        let mut r = record("full", Cancer::Prostate, "mCRPC", "Full");
        r.schemas = vec!["/schemas/a.png".to_string(), "/schemas/b.png".to_string()];
        r.protocol_document = Some("/protocols/full.pdf".to_string());
        r.contact = Some(Contact {
            name: Some("Carole Plante".to_string()),
            phone: Some("67712".to_string()),
        });
        r.primary_endpoints = vec!["OS".to_string()];
        r.secondary_endpoints = vec!["rPFS".to_string()];
        r.exclusion = vec!["Histologie à petites cellules".to_string()];

        assert_eq!(
            headings(&r),
            vec![
                "Schéma de l’étude",
                "Protocole complet",
                "Infirmière responsable",
                "Devis",
                "Population",
                "Endpoint primaire",
                "Endpoints secondaires",
                "Critères d’inclusion",
                "Critères d’exclusion",
            ]
        );
    }

    #[test]
    fn record_without_exclusion_has_no_exclusion_heading() {
        let catalogue = Catalogue::embedded(StagePolicy::Strict).unwrap();
        for p in catalogue.protocols() {
            assert!(p.exclusion.is_empty());
            assert!(!headings(p).contains(&"Critères d’exclusion"), "{}", p.id);
        }
    }

    #[test]
    fn contact_with_missing_phone_uses_placeholder() {
        let mut r = record("c", Cancer::Kidney, "Localisé", "Contact");
        r.contact = Some(Contact {
            name: Some("Marie-Christine Dubé".to_string()),
            phone: None,
        });
        let contact = detail_sections(&r)
            .into_iter()
            .find(|s| matches!(s, DetailSection::Contact { .. }))
            .unwrap();
        assert_eq!(
            contact,
            DetailSection::Contact {
                name: "Marie-Christine Dubé",
                phone: MISSING_CONTACT_PART,
            }
        );
    }

    #[test]
    fn suspended_record_has_watermark() {
        let mut r = record("s", Cancer::Bladder, "NMIBC", "Suspended");
        assert_eq!(watermark(&r), None);
        r.suspended = true;
        assert_eq!(watermark(&r), Some("SUSPENDU"));
    }

    #[test]
    fn card_badges_follow_record_fields() {
        let mut r = record("b", Cancer::Bladder, "NMIBC", "Badges");
        assert!(card_badges(&r).is_empty());

        r.randomized = true;
        r.phase = Some("Phase II".to_string());
        r.blinding = Some(Blinding::DoubleBlind);
        r.primary_endpoints = vec!["Temps jusqu’à la récidive".to_string()];
        r.highlights = vec!["HR NMIBC".to_string()];
        let texts: Vec<&str> = card_badges(&r).iter().map(|b| b.text()).collect();
        assert_eq!(
            texts,
            vec!["Randomisée", "Phase II", "Double-insu", "Endpoint primaire", "HR NMIBC"]
        );
    }

    proptest! {
        /// Inclusion always renders; optional sections appear iff their field is present.
        #[test]
        fn sections_track_optional_fields(
            schemas in prop::collection::vec("[a-z]{1,8}", 0..3),
            doc in prop::option::of("[a-z]{1,8}"),
            exclusion in prop::collection::vec("[a-z]{1,8}", 0..3),
            primary in prop::collection::vec("[a-z]{1,8}", 0..3),
            has_contact in any::<bool>(),
        ) {
            let mut r = record("p", Cancer::Prostate, "mCRPC", "Prop");
            r.schemas = schemas.clone();
            r.protocol_document = doc.clone();
            r.exclusion = exclusion.clone();
            r.primary_endpoints = primary.clone();
            r.contact = has_contact.then(|| Contact { name: Some("N".to_string()), phone: None });

            let h = headings(&r);
            prop_assert!(h.contains(&"Critères d’inclusion"));
            prop_assert_eq!(h.contains(&"Schéma de l’étude"), !schemas.is_empty());
            prop_assert_eq!(h.contains(&"Protocole complet"), doc.is_some());
            prop_assert_eq!(h.contains(&"Critères d’exclusion"), !exclusion.is_empty());
            prop_assert_eq!(h.contains(&"Endpoint primaire"), !primary.is_empty());
            prop_assert_eq!(h.contains(&"Infirmière responsable"), has_contact);
            prop_assert!(!h.contains(&"Endpoints secondaires"));
        }
    }
}
