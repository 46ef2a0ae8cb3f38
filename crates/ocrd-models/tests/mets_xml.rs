use ocrd_models::{FileFilter, Loctype, NewFile, OcrdFile, OcrdMets};
use std::path::Path;

const KANT_METS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:xlink="http://www.w3.org/1999/xlink">
  <mets:metsHdr CREATEDATE="2018-06-19T11:52:17"/>
  <mets:dmdSec ID="DMDLOG_0000"><mets:mdWrap MDTYPE="MODS"/></mets:dmdSec>
  <mets:fileSec>
    <mets:fileGrp USE="OCR-D-IMG">
      <mets:file ID="INPUT_0017" MIMETYPE="image/tiff">
        <mets:FLocat LOCTYPE="URL" xlink:href="https://example.org/kant/INPUT_0017.tif"/>
      </mets:file>
      <mets:file ID="INPUT_0020" MIMETYPE="image/tiff">
        <mets:FLocat LOCTYPE="OTHER" OTHERLOCTYPE="FILE" xlink:href="OCR-D-IMG/INPUT_0020.tif"/>
      </mets:file>
    </mets:fileGrp>
    <mets:fileGrp USE="OCR-D-GT-PAGE">
      <mets:file ID="PAGE_0017" MIMETYPE="application/vnd.prima.page+xml">
        <mets:FLocat LOCTYPE="OTHER" OTHERLOCTYPE="FILE" xlink:href="file:///data/kant/PAGE_0017.xml"/>
      </mets:file>
    </mets:fileGrp>
    <mets:fileGrp USE="OCR-D-EMPTY"/>
  </mets:fileSec>
  <mets:structMap TYPE="LOGICAL">
    <mets:div TYPE="page" ID="LOGICAL_NOT_A_PAGE"/>
  </mets:structMap>
  <mets:structMap TYPE="PHYSICAL">
    <mets:div TYPE="physSequence">
      <mets:div TYPE="page" ID="PHYS_0017">
        <mets:fptr FILEID="INPUT_0017"/>
        <mets:fptr FILEID="PAGE_0017"/>
      </mets:div>
      <mets:div TYPE="page" ID="PHYS_0020">
        <mets:fptr FILEID="INPUT_0020"/>
      </mets:div>
    </mets:div>
  </mets:structMap>
</mets:mets>
"#;

fn ids(files: Vec<&OcrdFile>) -> Vec<String> {
    files.iter().filter_map(|f| f.id()).map(str::to_string).collect()
}

#[test]
fn test_parse_descriptor() {
    let mets = OcrdMets::from_xml(KANT_METS.as_bytes()).unwrap();

    assert_eq!(mets.created(), Some("2018-06-19T11:52:17"));
    assert_eq!(mets.file_groups(), vec!["OCR-D-IMG", "OCR-D-GT-PAGE", "OCR-D-EMPTY"]);
    assert_eq!(mets.physical_pages(), vec!["PHYS_0017", "PHYS_0020"]);

    let remote = mets.file("INPUT_0017").unwrap();
    assert_eq!(remote.loctype(), Loctype::Url);
    assert_eq!(remote.otherloctype(), None);
    assert_eq!(remote.url(), Some("https://example.org/kant/INPUT_0017.tif"));
    assert_eq!(remote.local_filename(), None);
    assert_eq!(remote.file_grp(), "OCR-D-IMG");
    assert_eq!(remote.page_id(&mets).unwrap(), Some("PHYS_0017"));

    let local = mets.file("INPUT_0020").unwrap();
    assert_eq!(local.loctype(), Loctype::Other);
    assert_eq!(local.otherloctype(), Some("FILE"));
    assert_eq!(local.local_filename(), Some(Path::new("OCR-D-IMG/INPUT_0020.tif")));

    let page = mets.file("PAGE_0017").unwrap();
    assert_eq!(page.local_filename(), Some(Path::new("/data/kant/PAGE_0017.xml")));
    assert_eq!(page.extension(), ".xml");
}

#[test]
fn test_find_files_on_parsed_descriptor() {
    let mets = OcrdMets::from_xml(KANT_METS.as_bytes()).unwrap();

    let images = mets.find_files(&FileFilter::new().file_grp("OCR-D-IMG")).unwrap();
    assert_eq!(ids(images), vec!["INPUT_0017", "INPUT_0020"]);

    let on_page = mets.find_files(&FileFilter::new().page_id("PHYS_0017")).unwrap();
    assert_eq!(ids(on_page), vec!["INPUT_0017", "PAGE_0017"]);

    let by_url = mets.find_files(&FileFilter::new().url("//https://.*")).unwrap();
    assert_eq!(ids(by_url), vec!["INPUT_0017"]);
}

#[test]
fn test_serialize_then_parse_preserves_content() {
    let mut mets = OcrdMets::from_xml(KANT_METS.as_bytes()).unwrap();
    mets.add_file(
        "OCR-D-BIN",
        NewFile::new("BIN_0017")
            .mimetype("image/png")
            .url("https://example.org/kant/BIN_0017.png")
            .local_filename("OCR-D-BIN/BIN_0017.png")
            .page_id("PHYS_0017"),
    )
    .unwrap();
    mets.add_file("OCR-D-BIN", NewFile::new("NO_LOCATION").url("")).unwrap();

    let reparsed = OcrdMets::from_xml(&mets.to_xml().unwrap()).unwrap();

    assert_eq!(reparsed.created(), mets.created());
    assert_eq!(reparsed.file_groups(), mets.file_groups());
    assert_eq!(reparsed.physical_pages(), mets.physical_pages());
    for file in mets.files() {
        let other = reparsed.file(file.id().unwrap()).unwrap();
        assert_eq!(other, file);
        assert_eq!(other.url(), file.url());
        assert_eq!(other.local_filename(), file.local_filename());
        assert_eq!(other.loctype(), file.loctype());
        assert_eq!(other.otherloctype(), file.otherloctype());
        assert_eq!(other.file_grp(), file.file_grp());
        assert_eq!(other.page_id(&reparsed).unwrap(), file.page_id(&mets).unwrap());
    }
}

#[test]
fn test_empty_mets_roundtrip() {
    let mets = OcrdMets::empty_mets();
    let xml = mets.to_xml().unwrap();
    let text = String::from_utf8(xml.clone()).unwrap();
    assert!(text.contains("<mets:fileSec/>"));
    assert!(!text.contains("structMap"));

    let reparsed = OcrdMets::from_xml(&xml).unwrap();
    assert!(reparsed.file_groups().is_empty());
    assert_eq!(reparsed.files().count(), 0);
}

#[test]
fn test_attribute_values_are_escaped() {
    let mut mets = OcrdMets::empty_mets();
    mets.add_file("G", NewFile::new("F").url("http://x/?a=1&b=\"2\"")).unwrap();

    let reparsed = OcrdMets::from_xml(&mets.to_xml().unwrap()).unwrap();
    assert_eq!(reparsed.file("F").unwrap().url(), Some("http://x/?a=1&b=\"2\""));
}

#[test]
fn test_equality_across_groups() {
    let mut mets = OcrdMets::empty_mets();
    let f1 = mets.add_file("FOO", NewFile::new("FOO_1").mimetype("image/tiff")).unwrap().clone();
    let f2 = mets.add_file("FOO", NewFile::new("FOO_2").mimetype("image/tiff")).unwrap().clone();
    let f5 = mets.add_file("TEMP", NewFile::new("TEMP_1").mimetype("image/tiff")).unwrap().clone();
    let f3 = OcrdFile::new().with_id("TEMP_1").with_mimetype("image/tiff");

    assert!(f1 == f1);
    assert!(!(f1 != f1));
    assert!(f1 != f2);
    assert!(f3 == f5);
}

const ANNOTATED_METS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:mods="http://www.loc.gov/mods/v3" xmlns:xlink="http://www.w3.org/1999/xlink">
  <mets:metsHdr CREATEDATE="2018-06-19T11:52:17">
    <mets:agent ROLE="CREATOR" TYPE="OTHER" OTHERTYPE="SOFTWARE">
      <mets:name>ocrd/core</mets:name>
    </mets:agent>
  </mets:metsHdr>
  <mets:dmdSec ID="DMDLOG_0000">
    <mets:mdWrap MDTYPE="MODS">
      <mets:xmlData>
        <mods:mods>
          <mods:titleInfo><mods:title>Beantwortung &amp; Frage</mods:title></mods:titleInfo>
        </mods:mods>
      </mets:xmlData>
    </mets:mdWrap>
  </mets:dmdSec>
  <mets:amdSec ID="AMD"/>
  <mets:fileSec>
    <mets:fileGrp USE="OCR-D-IMG">
      <mets:file ID="INPUT_0017" MIMETYPE="image/tiff">
        <mets:FLocat LOCTYPE="URL" xlink:href="https://example.org/kant/INPUT_0017.tif"/>
      </mets:file>
    </mets:fileGrp>
  </mets:fileSec>
  <mets:structMap TYPE="LOGICAL">
    <mets:div TYPE="monograph" ID="LOG_0" DMDID="DMDLOG_0000"/>
  </mets:structMap>
  <mets:structMap TYPE="PHYSICAL">
    <mets:div TYPE="physSequence">
      <mets:div TYPE="page" ID="PHYS_0017">
        <mets:fptr FILEID="INPUT_0017"/>
      </mets:div>
    </mets:div>
  </mets:structMap>
  <mets:structLink>
    <mets:smLink xlink:from="LOG_0" xlink:to="PHYS_0017"/>
  </mets:structLink>
</mets:mets>
"#;

#[test]
fn test_unmodelled_sections_survive_serialization() {
    let mut mets = OcrdMets::from_xml(ANNOTATED_METS.as_bytes()).unwrap();
    mets.add_file("OCR-D-GT-PAGE", NewFile::new("PAGE_0017").page_id("PHYS_0017"))
        .unwrap();

    let xml = String::from_utf8(mets.to_xml().unwrap()).unwrap();
    assert!(xml.contains(r#"xmlns:mods="http://www.loc.gov/mods/v3""#));
    assert!(xml.contains("<mets:name>ocrd/core</mets:name>"));
    assert!(xml.contains("<mods:title>Beantwortung &amp; Frage</mods:title>"));
    assert!(xml.contains(r#"<mets:amdSec ID="AMD"/>"#));
    assert!(xml.contains(r#"<mets:div TYPE="monograph" ID="LOG_0" DMDID="DMDLOG_0000"/>"#));
    assert!(xml.contains(r#"<mets:smLink xlink:from="LOG_0" xlink:to="PHYS_0017"/>"#));

    let position = |needle: &str| xml.find(needle).unwrap();
    assert!(position("<mets:dmdSec") < position("<mets:fileSec"));
    assert!(position("<mets:amdSec") < position("<mets:fileSec"));
    assert!(position(r#"TYPE="PHYSICAL""#) < position("<mets:structLink"));

    let reparsed = OcrdMets::from_xml(xml.as_bytes()).unwrap();
    assert_eq!(reparsed.created(), Some("2018-06-19T11:52:17"));
    assert_eq!(reparsed.file_groups(), vec!["OCR-D-IMG", "OCR-D-GT-PAGE"]);
    assert_eq!(reparsed.page_id_of("PAGE_0017"), Some("PHYS_0017"));
    assert_eq!(reparsed.physical_pages(), vec!["PHYS_0017"]);
    assert_eq!(String::from_utf8(reparsed.to_xml().unwrap()).unwrap(), xml);
}
