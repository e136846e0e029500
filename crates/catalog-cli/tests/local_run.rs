//! Configuration-driven catalog run over CSV files.

use std::fs;
use std::path::Path;

use catalog_cli::config::{CatalogConfig, Overrides};
use catalog_model::Dataset;
use catalog_storage::open_storage;
use catalog_validate::{CatalogContext, run_catalog};

const INPUTS: [(&str, &str); 10] = [
    (
        "courses.csv",
        "course_id,course_code,course_name_mk,course_name_en,course_url,course_level\n\
         c1,F23L1W001,Вовед,Intro,https://finki.ukim.mk/c1,1\n\
         c2,F23L2S002,Структури,Structures,https://finki.ukim.mk/c2,2\n\
         c3,F23L3W003,Компајлери,Compilers,https://finki.ukim.mk/c3,3\n",
    ),
    (
        "professors.csv",
        "professor_id,professor_name,professor_surname\np1,Ana,Petrova\n",
    ),
    (
        "study_programs.csv",
        "study_program_id,study_program_code,study_program_name,study_program_duration,study_program_url\n\
         sp1,KNI4,Computer Science,4,https://finki.ukim.mk/kni\n",
    ),
    (
        "teaches.csv",
        "teaches_id,course_id,professor_id\nt1,c1,p1\nt2,c2,\n",
    ),
    (
        "requisites.csv",
        "requisite_id,course_prerequisite_type,minimum_required_number_of_courses\n\
         q1,ONE,1\nq2,TOTAL,2\n",
    ),
    (
        "curricula.csv",
        "curriculum_id,course_type,course_semester_season,course_academic_year,course_semester\n\
         cu1,MANDATORY,WINTER,1,1\n\
         cu2,ELECTIVE,SUMMER,2,4\n\
         cu3,ELECTIVE,WINTER,3,5\n",
    ),
    (
        "offers.csv",
        "offers_id,curriculum_id,study_program_id\no1,cu1,sp1\no2,cu2,sp1\no3,cu3,sp1\n",
    ),
    (
        "includes.csv",
        "includes_id,curriculum_id,course_id\ni1,cu1,c1\ni2,cu2,c2\ni3,cu3,c3\n",
    ),
    (
        "requires.csv",
        "requires_id,curriculum_id,requisite_id\nr1,cu2,q1\nr2,cu3,q2\n",
    ),
    (
        "satisfies.csv",
        "satisfies_id,prerequisite_course_id,requisite_id\ns1,c1,q1\ns2,c1,q2\ns3,c2,q2\ns4,c3,q2\n",
    ),
];

fn write_inputs(dir: &Path) {
    for (name, content) in INPUTS {
        fs::write(dir.join(name), content).unwrap();
    }
}

#[test]
fn test_configured_local_run_writes_cleaned_files() {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("in");
    let output = root.path().join("out");
    fs::create_dir_all(&input).unwrap();
    write_inputs(&input);
    let config_path = root.path().join("catalog.toml");
    fs::write(
        &config_path,
        r#"
[storage]
kind = "local"

[storage.files]
prerequisites = "satisfies.csv"
postrequisites = "requires.csv"

[rules]
closure_depth = 1
"#,
    )
    .unwrap();

    let mut config = CatalogConfig::load(Some(&config_path)).unwrap();
    config.apply_overrides(&Overrides {
        input_dir: Some(input),
        output_dir: Some(output.clone()),
        ..Overrides::default()
    });
    let storage = open_storage(&config.storage).unwrap();
    let summary = run_catalog(&CatalogContext::from_storage(&storage, config.rules)).unwrap();

    assert_eq!(summary.closure_depth, 1);
    assert_eq!(summary.get(Dataset::Teaches).map(|d| d.stored_rows), Some(1));
    // cu3 needs two of {c1, c2, c3}; all three are offered
    assert_eq!(summary.get(Dataset::Curricula).map(|d| d.stored_rows), Some(3));

    let curricula = fs::read_to_string(output.join("curricula.csv")).unwrap();
    assert_eq!(
        curricula.lines().next(),
        Some("curriculum_id,course_type,course_semester_season,course_academic_year,course_semester")
    );
    assert_eq!(curricula.lines().count(), 4);
    let satisfies = fs::read_to_string(output.join("satisfies.csv")).unwrap();
    assert_eq!(satisfies.lines().count(), 5);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    let err = CatalogConfig::load(Some(&root.path().join("absent.toml"))).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[test]
fn test_unsupported_storage_kind_is_rejected() {
    let mut config = CatalogConfig::default();
    config.apply_env(|key| (key == "FILE_STORAGE_TYPE").then(|| "minio".to_string()));

    let err = open_storage(&config.storage).unwrap_err();

    assert!(err.to_string().contains("minio"));
}
