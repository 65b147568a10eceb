//! SBML model reader
//!
//! Streams an SBML document and builds the identifier map of its species. Only
//! the parts needed for mapping are read:
//!
//! - the `id`, `metaid`, `name` and `compartment` attributes of every
//!   `species` element, in document order (which is the model's species order)
//! - the `rdf:resource` URIs of all `rdf:li` elements nested in a species
//!
//! Elements are matched by local name, so SBML level 2 and level 3 documents
//! (and their different default namespaces) are handled alike. Reactions,
//! genes and everything else are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::report::{Report, Stage};
use crate::sbml::{
    annotations::AnnotationIds,
    error::ModelError,
    species::{split_species_id, MetabolicModel, ModelSpecies},
};

/// Attributes and annotation URIs collected for one `species` element.
#[derive(Debug, Default)]
struct RawSpecies {
    id: Option<String>,
    metaid: Option<String>,
    name: Option<String>,
    compartment: Option<String>,
    uris: Vec<String>,
}

/// Reads a metabolic model from an SBML file.
///
/// # Arguments
/// * `path` - Path to the SBML/XML model
/// * `report` - Receives species that were skipped or carry no identifiers
///
/// # Returns
/// * `Result<MetabolicModel, ModelError>` - The model's species or a read/parse error
pub fn read_model(
    path: impl AsRef<Path>,
    report: &mut Report,
) -> Result<MetabolicModel, ModelError> {
    let path = path.as_ref();
    log::info!("Parsing metabolic model {}", path.display());

    let file = File::open(path)?;
    let model = parse_model(BufReader::new(file), report)?;

    if model.is_empty() {
        return Err(ModelError::NoSpecies(path.to_path_buf()));
    }

    log::info!(
        "Metabolic map complete: {} species in {} compartments",
        model.len(),
        model.compartments().len()
    );
    Ok(model)
}

/// Parses SBML from any buffered reader.
pub fn parse_model<R: BufRead>(
    source: R,
    report: &mut Report,
) -> Result<MetabolicModel, ModelError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut model = MetabolicModel::default();
    let mut current: Option<RawSpecies> = None;
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| ModelError::XmlError {
                position: reader.error_position() as u64,
                source,
            })?;

        match event {
            Event::Start(ref element) => match element.local_name().as_ref() {
                b"model" if model.id.is_none() => {
                    model.id = attribute(&reader, element, b"id")?;
                }
                b"species" if current.is_none() => {
                    current = Some(read_species_attributes(&reader, element)?);
                    depth = 1;
                }
                b"li" => {
                    if let Some(species) = current.as_mut() {
                        species.uris.extend(attribute(&reader, element, b"resource")?);
                    }
                    depth += usize::from(current.is_some());
                }
                _ => depth += usize::from(current.is_some()),
            },
            Event::Empty(ref element) => match element.local_name().as_ref() {
                b"species" if current.is_none() => {
                    let species = read_species_attributes(&reader, element)?;
                    push_species(&mut model, species, report)?;
                }
                b"li" => {
                    if let Some(species) = current.as_mut() {
                        species.uris.extend(attribute(&reader, element, b"resource")?);
                    }
                }
                _ => {}
            },
            Event::End(_) => {
                if current.is_some() {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(species) = current.take() {
                            push_species(&mut model, species, report)?;
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    Ok(model)
}

fn read_species_attributes<R>(
    reader: &Reader<R>,
    element: &BytesStart,
) -> Result<RawSpecies, ModelError> {
    Ok(RawSpecies {
        id: attribute(reader, element, b"id")?,
        metaid: attribute(reader, element, b"metaid")?,
        name: attribute(reader, element, b"name")?,
        compartment: attribute(reader, element, b"compartment")?,
        uris: Vec::new(),
    })
}

/// Value of the attribute with the given local name, if present.
fn attribute<R>(
    reader: &Reader<R>,
    element: &BytesStart,
    local_name: &[u8],
) -> Result<Option<String>, ModelError> {
    let xml_error = |source: quick_xml::Error| ModelError::XmlError {
        position: reader.buffer_position() as u64,
        source,
    };

    for attr in element.attributes() {
        let attr = attr.map_err(|e| xml_error(e.into()))?;
        if attr.key.local_name().as_ref() == local_name {
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(|e| xml_error(e.into()))?;
            return Ok(Some(value.trim().to_string()).filter(|v| !v.is_empty()));
        }
    }

    Ok(None)
}

fn push_species(
    model: &mut MetabolicModel,
    raw: RawSpecies,
    report: &mut Report,
) -> Result<(), ModelError> {
    let index = model.species.len();
    let id = raw
        .id
        .clone()
        .or_else(|| raw.metaid.clone())
        .ok_or(ModelError::MissingSpeciesId(index))?;
    let bigg = raw.metaid.clone().unwrap_or_else(|| id.clone());

    if model.species.iter().any(|s| s.id == id) {
        report.warn(Stage::Model, &id, "duplicate species id");
    }

    let (key, compartment) = split_species_id(&id, raw.compartment.as_deref());
    let ids = AnnotationIds::from_uris(&raw.uris);

    let species = ModelSpecies {
        index,
        id,
        bigg,
        name: raw.name,
        compartment,
        key,
        chebi: ids.chebi,
        hmdb: ids.hmdb,
        kegg: ids.kegg,
    };

    if !species.has_identifiers() {
        report.info(
            Stage::Model,
            &species.id,
            "no ChEBI, HMDB or KEGG annotation",
        );
    }

    log::debug!(
        "species {} ({}): {} chebi, {} hmdb, {} kegg",
        species.index,
        species.id,
        species.chebi.len(),
        species.hmdb.len(),
        species.kegg.len()
    );

    model.species.push(species);
    Ok(())
}
