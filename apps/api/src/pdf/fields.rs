//! Which PDF form field receives which contract value, per template.

use chrono::NaiveDate;

use crate::models::contract::{hungarian_long_date, ContractForm};
use crate::pdf::TemplateKind;

/// `(pdf_field_name, value)` pairs for one template. Values are passed through
/// untouched; blank ones are skipped by the filler.
pub type FieldValues = Vec<(&'static str, Option<String>)>;

pub fn field_values(kind: TemplateKind, form: &ContractForm, today: NaiveDate) -> FieldValues {
    match kind {
        TemplateKind::Main => main_contract(form),
        TemplateKind::Kellekszavatossag => warranty_statement(form, today),
        TemplateKind::Meghatalmazas => authorisation(form),
    }
}

fn main_contract(f: &ContractForm) -> FieldValues {
    vec![
        ("rendszam", f.rendszam.clone()),
        ("gyartmany_tipus", f.gyartmany_tipus.clone()),
        ("alvazszam", f.alvazszam.clone()),
        ("motorszam", f.motorszam.clone()),
        ("km_allas", f.km_allas.clone()),
        ("torzskonyv_szam", f.torzskonyv_szam.clone()),
        ("forgalmi_szam", f.forgalmi_szam.clone()),
        ("km_idopont", f.km_idopont.clone()),
        ("ceg_neve", f.ceg_neve.clone()),
        ("ceg_kepviselo", f.ceg_kepviselo.clone()),
        ("cegjegyzekszam", f.cegjegyzekszam.clone()),
        ("ceg_szekhely", f.szekhely.clone()),
        ("vevo_nev", f.vevo_nev.clone()),
        ("vevo_szul_hely_ido", f.vevo_szul_hely_ido.clone()),
        ("vevo_anyja_neve", f.vevo_anyja_neve.clone()),
        ("vevo_okmany_szam", f.vevo_okmany_szam.clone()),
        ("vevo_lakcim", f.vevo_lakcim.clone()),
        ("atadas_ev", f.atadas_ev.clone()),
        ("atadas_ho", f.atadas_ho.clone()),
        ("atadas_nap", f.atadas_nap.clone()),
        ("hataly_ev", f.hataly_ev.clone()),
        ("hataly_ho", f.hataly_ho.clone()),
        ("hataly_nap", f.hataly_nap.clone()),
        ("birtok_ev", f.birtok_ev.clone()),
        ("birtok_ho", f.birtok_ho.clone()),
        ("birtok_nap", f.birtok_nap.clone()),
        ("birtok_ora", f.birtok_ora.clone()),
        ("birtok_perc", f.birtok_perc.clone()),
        ("szerzodes_ev", f.szerzodes_ev.clone()),
        ("szerzodes_ho", f.szerzodes_ho.clone()),
        ("szerrzodes_nap", f.szerrzodes_nap.clone()),
        ("tanu1_nev", f.tanu1_nev.clone()),
        ("tanu1_lakcim", f.tanu1_lakcim.clone()),
        ("tanu1_szig", f.tanu1_szig.clone()),
        ("tanu2_nev", f.tanu2_nev.clone()),
        ("tanu2_lakcim", f.tanu2_lakcim.clone()),
        ("tanu2_szig", f.tanu2_szig.clone()),
        ("vetelar_szam", f.vetelar_szam.clone()),
        ("vetelar_betukkel", f.vetelar_betukkel.clone()),
        ("fizetesi_mod", f.effective_payment_method()),
        ("fizetesi_datum", f.fizetesi_datum.clone()),
    ]
}

// The warranty form's "rendszam" box holds the chassis number.
fn warranty_statement(f: &ContractForm, today: NaiveDate) -> FieldValues {
    vec![
        ("kell_rendszam", f.alvazszam.clone()),
        ("kell_tovabbi_info", f.kell_tovabbi_info.clone()),
        ("kell_datum", Some(hungarian_long_date(today))),
    ]
}

fn authorisation(f: &ContractForm) -> FieldValues {
    vec![
        ("meghatalmazo_nev_megh", f.vevo_nev.clone()),
        ("meghatalmazo_lakcim_megh", f.vevo_lakcim.clone()),
        ("meghatalmazo_szig_szam_megh", f.vevo_okmany_szam.clone()),
        ("meghatalmazo_anyja_neve_megh", f.vevo_anyja_neve.clone()),
        ("meghatalmazo_szul_hely_ido_megh", f.vevo_szul_hely_ido.clone()),
        ("meghatalmazott_nev_cim_megh", f.meghatalmazott_adatok.clone()),
        ("meghatalmazas_rendszam_megh", f.rendszam.clone()),
        ("meghatalmazas_gyartmany_megh", f.gyartmany_tipus.clone()),
        ("meghatalmazas_alvazszam_megh", f.alvazszam.clone()),
        ("meghatalmazas_datum_ev", f.szerzodes_ev.clone()),
        ("meghatalmazas_datum_ho", f.szerzodes_ho.clone()),
        ("meghatalmazas_datum_nap", f.szerrzodes_nap.clone()),
        ("tanu1_nev_megh", f.tanu1_nev.clone()),
        ("tanu1_lakcim_megh", f.tanu1_lakcim.clone()),
        ("tanu2_nev_megh", f.tanu2_nev.clone()),
        ("tanu2_lakcim_megh", f.tanu2_lakcim.clone()),
        ("tanu1_szemelyi_megh", f.tanu1_szig.clone()),
        ("tanu2_szemelyi_megh", f.tanu2_szig.clone()),
    ]
}
