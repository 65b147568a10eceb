//! Integration tests running the full pipeline against fixture files, with the
//! MetaboAnalyst and PubChem services mocked by httpmock.

#[cfg(test)]
mod test_pipeline {
    use std::path::PathBuf;

    use httpmock::{Method::GET, Method::POST, MockServer};
    use metabomap::prelude::{
        identifiers_from_csv, read_model, Cell, PipelineConfigBuilder, Pipeline, Report, Stage,
        IDENTIFIERS_CHECKPOINT, MATCHES_CHECKPOINT, MODEL_CHECKPOINT, POSITIONS_CHECKPOINT,
        SYNONYMS_CHECKPOINT,
    };
    use metabomap::tabular::reader::read_table;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("data")
            .join(name)
    }

    fn mapcompounds_response() -> serde_json::Value {
        json!({
            "query": ["Glucose", "Lactate", "Citrate", "Unknown compound"],
            "hit": ["D-Glucose", "L-Lactic acid", "Citric acid", "NA"],
            "hmdb_id": ["HMDB0000122", "HMDB0000190", "HMDB0000094", "-"],
            "pubchem_id": ["5793", "107689", "311", "-"],
            "chebi_id": ["17234", "16651", "30769", "-"],
            "kegg_id": ["C00031", "C00186", "C00158", "-"],
            "metlin_id": ["-", "-", "-", "-"],
            "comment": ["1", "1", "1", "0"]
        })
    }

    fn expected_rows() -> Vec<Vec<Cell>> {
        vec![
            vec![
                Cell::Text("Glucose".to_string()),
                Cell::Number(0.0),
                Cell::Number(1.0),
                Cell::Number(1.5),
                Cell::Number(2.0),
            ],
            vec![
                Cell::Text("Lactate".to_string()),
                Cell::Number(2.0),
                Cell::Number(6.0),
                Cell::Number(3.2),
                Cell::Number(2.8),
            ],
            vec![
                Cell::Text("Citrate".to_string()),
                Cell::Number(3.0),
                Cell::Empty,
                Cell::Number(0.4),
                Cell::Number(0.5),
            ],
        ]
    }

    /// The model map keeps the ChEBI id of an annotated species.
    #[test]
    fn test_model_map_fixture() {
        let mut report = Report::new();
        let model = read_model(data_path("model.xml"), &mut report).unwrap();

        assert_eq!(model.id.as_deref(), Some("toy_core"));
        assert_eq!(model.len(), 7);
        assert_eq!(model.compartments(), vec!["c", "e"]);

        let glucose = &model.species[0];
        assert_eq!(glucose.bigg, "M_glc__D_c");
        assert_eq!(glucose.chebi, vec!["17234"]);
        assert_eq!(glucose.hmdb, vec!["HMDB0000122"]);
        assert_eq!(glucose.kegg, vec!["C00031"]);

        let water = report.by_stage(Stage::Model);
        assert_eq!(water.len(), 1);
        assert_eq!(water[0].subject, "M_h2o_c");
    }

    #[test]
    fn test_full_run_with_mocked_service() {
        // ARRANGE
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/mapcompounds")
                .header("cache-control", "no-cache")
                .json_body(json!({
                    "queryList": "Glucose;Lactate;Citrate;Unknown compound",
                    "inputType": "name"
                }));
            then.status(200).json_body(mapcompounds_response());
        });

        let dir = tempfile::tempdir().unwrap();
        let checkpoints = dir.path().join("checkpoints");
        let output = dir.path().join("mapped.xlsx");

        let config = PipelineConfigBuilder::default()
            .mapcompounds_url(server.url("/mapcompounds"))
            .checkpoint_dir(checkpoints.clone())
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build();

        // ACT
        let summary = pipeline
            .run(
                data_path("measurements.csv"),
                data_path("model.xml"),
                Some(output.clone()),
            )
            .unwrap();

        // ASSERT
        mock.assert();

        assert_eq!(summary.measured, 4);
        assert_eq!(summary.queries, 4);
        assert_eq!(summary.identified, 3);
        assert_eq!(summary.species, 7);
        assert_eq!(summary.matches, 5);
        assert_eq!(summary.positioned, 3);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.compartments, vec!["c", "e"]);
        assert_eq!(summary.output, output);
        assert_eq!(summary.report.warnings(), 0);
        assert!(summary.report.by_stage(Stage::Positions).is_empty());

        let unknown = summary
            .report
            .entries
            .iter()
            .filter(|entry| entry.subject == "Unknown compound")
            .count();
        assert_eq!(unknown, 3);

        let dataset = read_table(&output).unwrap();
        assert_eq!(dataset.headers, vec!["Metabolite", "c", "e", "S1", "S2"]);
        assert_eq!(dataset.rows, expected_rows());

        for name in [
            IDENTIFIERS_CHECKPOINT,
            MODEL_CHECKPOINT,
            MATCHES_CHECKPOINT,
            POSITIONS_CHECKPOINT,
        ] {
            assert!(checkpoints.join(name).exists(), "missing checkpoint {name}");
        }
        assert!(!checkpoints.join(SYNONYMS_CHECKPOINT).exists());

        let identifiers = identifiers_from_csv(checkpoints.join(IDENTIFIERS_CHECKPOINT)).unwrap();
        assert_eq!(identifiers.len(), 4);
        assert_eq!(identifiers[0].chebi.as_deref(), Some("17234"));
    }

    #[test]
    fn test_run_from_identifier_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("mapped.xlsx");

        // Nothing listens on this address; the checkpoint must make the request unnecessary.
        let config = PipelineConfigBuilder::default()
            .mapcompounds_url("http://127.0.0.1:9/mapcompounds")
            .build()
            .unwrap();
        let pipeline = Pipeline::builder()
            .config(config)
            .identifiers(data_path("identifiers.csv"))
            .build();

        let summary = pipeline
            .run(
                data_path("measurements.csv"),
                data_path("model.xml"),
                Some(output.clone()),
            )
            .unwrap();

        assert_eq!(summary.identified, 3);
        assert_eq!(summary.rows, 3);

        let dataset = read_table(&output).unwrap();
        assert_eq!(dataset.rows, expected_rows());
    }

    #[test]
    fn test_synonym_expansion() {
        let server = MockServer::start();
        let synonyms = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/pug/compound/name/Glucose/synonyms/JSON");
            then.status(200).json_body(json!({
                "InformationList": {
                    "Information": [
                        {"CID": 5793, "Synonym": ["D-Glucose", "Dextrose"]}
                    ]
                }
            }));
        });
        let mapcompounds = server.mock(|when, then| {
            when.method(POST).path("/mapcompounds");
            then.status(200).json_body(mapcompounds_response());
        });

        let dir = tempfile::tempdir().unwrap();
        let checkpoints = dir.path().join("checkpoints");
        let config = PipelineConfigBuilder::default()
            .mapcompounds_url(server.url("/mapcompounds"))
            .pubchem_url(server.url("/rest/pug"))
            .expand_synonyms(true)
            .checkpoint_dir(checkpoints.clone())
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build();

        let summary = pipeline
            .run(
                data_path("measurements.csv"),
                data_path("model.xml"),
                Some(dir.path().join("mapped.xlsx")),
            )
            .unwrap();

        synonyms.assert();
        mapcompounds.assert();

        assert_eq!(summary.measured, 4);
        assert_eq!(summary.queries, 6);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.report.by_stage(Stage::Synonyms).len(), 3);
        assert!(checkpoints.join(SYNONYMS_CHECKPOINT).exists());
    }

    #[test]
    fn test_service_failure_aborts() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/mapcompounds");
            then.status(500);
        });

        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfigBuilder::default()
            .mapcompounds_url(server.url("/mapcompounds"))
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build();

        let output = dir.path().join("mapped.xlsx");
        let result = pipeline.run(
            data_path("measurements.csv"),
            data_path("model.xml"),
            Some(output.clone()),
        );

        assert!(result.is_err());
        assert!(!output.exists());
    }
}
