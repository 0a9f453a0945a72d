//! NF-e extraction tests against complete, realistically shaped documents.

#![cfg(feature = "nfe")]

use chrono::NaiveDate;
use difal::core::*;
use difal::nfe::*;
use rust_decimal_macros::dec;

/// An authorized NF-e as returned by SEFAZ: `nfeProc` wrapper, emitter and
/// destination blocks, three items (one intra-state), totals, transport and
/// a signature in the XML-DSig namespace.
fn authorized_nfe(emitter_uf: &str) -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe>
    <infNFe Id="NFe35240111222333000181550010000010011000010010" versao="4.00">
      <ide>
        <cUF>35</cUF>
        <natOp>VENDA DE MERCADORIA</natOp>
        <mod>55</mod>
        <serie>1</serie>
        <nNF>1001</nNF>
        <dhEmi>2024-01-05T10:30:00-03:00</dhEmi>
        <dhSaiEnt>2024-01-05T11:00:00-03:00</dhSaiEnt>
        <tpNF>1</tpNF>
        <idDest>2</idDest>
      </ide>
      <emit>
        <CNPJ>12345678000195</CNPJ>
        <xNome>Fornecedor Paulista Ltda</xNome>
        <enderEmit>
          <xLgr>Rua das Flores</xLgr>
          <nro>100</nro>
          <xMun>Sao Paulo</xMun>
          <UF>{emitter_uf}</UF>
          <CEP>01001000</CEP>
        </enderEmit>
        <IE>111222333444</IE>
      </emit>
      <dest>
        <CNPJ>11222333000181</CNPJ>
        <xNome>Cliente Mineiro &amp; Filhos Ltda</xNome>
        <enderDest>
          <xLgr>Av. Afonso Pena</xLgr>
          <xMun>Belo Horizonte</xMun>
          <UF>MG</UF>
        </enderDest>
        <indIEDest>1</indIEDest>
      </dest>
      <det nItem="1">
        <prod>
          <cProd>A-100</cProd>
          <xProd>Parafuso sextavado</xProd>
          <CFOP>6102</CFOP>
          <uCom>UN</uCom>
          <qCom>1000.0000</qCom>
          <vProd>1000.00</vProd>
        </prod>
        <imposto>
          <ICMS>
            <ICMS00>
              <orig>0</orig>
              <CST>00</CST>
              <modBC>3</modBC>
              <vBC>1000.00</vBC>
              <pICMS>12.00</pICMS>
              <vICMS>120.00</vICMS>
            </ICMS00>
          </ICMS>
          <IPI>
            <cEnq>999</cEnq>
            <IPITrib><CST>50</CST><vBC>1000.00</vBC><pIPI>5.00</pIPI><vIPI>50.00</vIPI></IPITrib>
          </IPI>
        </imposto>
      </det>
      <det nItem="2">
        <prod>
          <cProd>B-200</cProd>
          <xProd>Amostra gratis</xProd>
          <CFOP>5102</CFOP>
          <vProd>10.00</vProd>
        </prod>
        <imposto>
          <ICMS><ICMS00><vBC>10.00</vBC><pICMS>18.00</pICMS><vICMS>1.80</vICMS></ICMS00></ICMS>
        </imposto>
      </det>
      <det nItem="3">
        <prod>
          <cProd>C-300</cProd>
          <xProd>Chapa importada</xProd>
          <CFOP>6101</CFOP>
          <vProd>500.00</vProd>
        </prod>
        <imposto>
          <ICMS>
            <ICMS00><orig>1</orig><vBC>500.00</vBC><pICMS>4.00</pICMS><vICMS>20.00</vICMS></ICMS00>
          </ICMS>
        </imposto>
      </det>
      <total>
        <ICMSTot>
          <vBC>1510.00</vBC>
          <vICMS>141.80</vICMS>
          <vNF>1560.00</vNF>
        </ICMSTot>
      </total>
      <transp><modFrete>0</modFrete></transp>
    </infNFe>
    <Signature xmlns="http://www.w3.org/2000/09/xmldsig#">
      <SignedInfo><Reference URI="#NFe3524"><DigestValue>abc=</DigestValue></Reference></SignedInfo>
      <SignatureValue>xyz=</SignatureValue>
    </Signature>
  </NFe>
  <protNFe versao="4.00">
    <infProt>
      <nProt>135240000000001</nProt>
      <cStat>100</cStat>
    </infProt>
  </protNFe>
</nfeProc>"##
    )
}

#[test]
fn authorized_document_is_fully_read() {
    let outcome = parse_nfe_str(&authorized_nfe("SP"));
    let parsed = outcome.parsed().expect("document should parse");
    let rec = &parsed.record;

    assert_eq!(rec.number, "1001");
    assert_eq!(rec.emitted_at, "2024-01-05T10:30:00-03:00");
    assert_eq!(rec.emission_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(rec.destination_tax_id, "11222333000181");
    assert_eq!(rec.destination_name, "Cliente Mineiro & Filhos Ltda");
    assert_eq!(rec.origin_state, "SP");

    assert_eq!(rec.items.len(), 2);
    assert_eq!(
        rec.items[0],
        LineItem::new("1", "6102", dec!(1000.00), dec!(120.00), dec!(12.00))
    );
    assert_eq!(
        rec.items[1],
        LineItem::new("3", "6101", dec!(500.00), dec!(20.00), dec!(4.00))
    );

    assert!(parsed.alerts.is_empty());
    assert_eq!(
        parsed.client,
        ClientTouch {
            tax_id: "11222333000181".into(),
            name: "Cliente Mineiro & Filhos Ltda".into(),
        }
    );
}

#[test]
fn authorized_document_feeds_aggregation() {
    let outcome = parse_nfe(authorized_nfe("PR").as_bytes());
    let ParseOutcome::Parsed(parsed) = outcome else {
        panic!("expected a parsed invoice");
    };
    let summary = summarize_invoice(&parsed.record).unwrap().unwrap();
    let rates: Vec<String> = summary.results.iter().map(|r| format_rate(r.rate)).collect();
    assert_eq!(rates, ["4.0", "12.0"]);
    // 480 / 0.82 * 0.18 - 20 = 85.37
    assert_eq!(format_amount(summary.results[0].differential), "85.37");
    assert_eq!(format_amount(summary.results[1].differential), "73.17");
    assert_eq!(format_amount(summary.total_differential), "158.54");
}

#[test]
fn emitter_in_mg_is_excluded() {
    let outcome = parse_nfe_str(&authorized_nfe("MG"));
    match outcome {
        ParseOutcome::Excluded { number } => assert_eq!(number, "1001"),
        other => panic!("expected Excluded, got {}", other.kind()),
    }
}

#[test]
fn destination_uf_does_not_count_as_origin() {
    // enderDest/UF is MG in the fixture; only enderEmit/UF decides.
    assert_eq!(parse_nfe_str(&authorized_nfe("RJ")).kind(), "parsed");
}

#[test]
fn bare_nfe_without_proc_wrapper() {
    let xml = r#"<NFe xmlns="http://www.portalfiscal.inf.br/nfe"><infNFe>
        <ide><nNF>7</nNF><dhEmi>2024-06-30T08:00:00-03:00</dhEmi></ide>
        <emit><enderEmit><UF>GO</UF></enderEmit></emit>
        <dest><CNPJ>99988877000108</CNPJ><xNome>Destino</xNome></dest>
        <det nItem="1"><prod><CFOP>6102</CFOP></prod>
          <imposto><ICMS><ICMS20><vBC>80.00</vBC><pICMS>7.00</pICMS><vICMS>5.60</vICMS></ICMS20></ICMS></imposto>
        </det>
    </infNFe></NFe>"#;
    let parsed = parse_nfe_str(xml).parsed().cloned().unwrap();
    assert_eq!(parsed.record.items[0].tax_rate, dec!(7));
    assert_eq!(
        parsed.alerts,
        vec![Alert::new("Invoice 7: rate 7.0% differs from 4% or 12%.")]
    );
}

#[test]
fn wrong_namespace_is_malformed() {
    let xml = authorized_nfe("SP").replace(
        "http://www.portalfiscal.inf.br/nfe",
        "http://example.com/not-nfe",
    );
    assert!(matches!(parse_nfe_str(&xml), ParseOutcome::Malformed(_)));
}

#[test]
fn truncated_document_is_malformed() {
    let xml = authorized_nfe("SP");
    let truncated = &xml[..xml.len() / 2];
    assert_eq!(parse_nfe_str(truncated).kind(), "malformed");
}

#[test]
fn non_utf8_bytes_are_malformed() {
    let bytes = [0x3c, 0x4e, 0xff, 0xfe, 0x3e];
    assert!(matches!(
        parse_nfe(&bytes),
        ParseOutcome::Malformed(DifalError::Xml(_))
    ));
}

#[test]
fn missing_destination_is_malformed() {
    let xml = authorized_nfe("SP").replace("<xNome>Cliente Mineiro &amp; Filhos Ltda</xNome>", "");
    match parse_nfe_str(&xml) {
        ParseOutcome::Malformed(DifalError::Field(field)) => assert_eq!(field, "dest/xNome"),
        other => panic!("expected missing dest/xNome, got {}", other.kind()),
    }
}

#[test]
fn unreadable_amount_is_malformed() {
    let xml = authorized_nfe("SP").replace("<vBC>1000.00</vBC>", "<vBC>mil reais</vBC>");
    assert!(matches!(
        parse_nfe_str(&xml),
        ParseOutcome::Malformed(DifalError::Decimal { .. })
    ));
}

#[test]
fn only_intra_state_items_leave_record_empty() {
    let xml = authorized_nfe("SP")
        .replace("<CFOP>6102</CFOP>", "<CFOP>5102</CFOP>")
        .replace("<CFOP>6101</CFOP>", "<CFOP>5405</CFOP>");
    let parsed = parse_nfe_str(&xml).parsed().cloned().unwrap();
    assert!(parsed.record.items.is_empty());
    assert!(summarize_invoice(&parsed.record).unwrap().is_none());
}

#[test]
fn kept_item_without_icms_drops_document() {
    // Item 3 loses its ICMS block; only IPI is left.
    let xml = authorized_nfe("SP").replace(
        "<ICMS>\n            <ICMS00><orig>1</orig><vBC>500.00</vBC><pICMS>4.00</pICMS><vICMS>20.00</vICMS></ICMS00>\n          </ICMS>",
        "<IPI><IPINT><CST>53</CST></IPINT></IPI>",
    );
    assert!(!xml.contains("<pICMS>4.00</pICMS>"));
    match parse_nfe_str(&xml) {
        ParseOutcome::Malformed(DifalError::Field(field)) => {
            assert_eq!(field, "det[3]/imposto/ICMS")
        }
        other => panic!("expected missing ICMS, got {}", other.kind()),
    }
}

#[test]
fn empty_icms_value_drops_document() {
    let xml = authorized_nfe("SP").replace("<vBC>1000.00</vBC>\n", "<vBC/>\n");
    assert!(matches!(
        parse_nfe_str(&xml),
        ParseOutcome::Malformed(DifalError::Decimal { ref field, .. }) if field == "vBC"
    ));
}
