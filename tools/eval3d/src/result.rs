//! 评估结果.

use std::io::{self, Write};

use seg_berry::{Measure, Summary};

/// 单个受试者的 3D 评估结果.
#[derive(Debug)]
pub struct SubjectRow {
    /// 相对体积差. 真值为空时为 `None`.
    pub rvd: Option<f64>,
    /// 绝对体积差. 真值为空时为 `None`.
    pub avd: Option<f64>,
    /// 整体 Dice.
    pub dice: Measure,
}

/// 将 `row` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, row: &SubjectRow, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Subject `{name}`:")?;
    writeln!(w, "{S4}Relative volume difference: {}", Measure::from(row.rvd))?;
    writeln!(w, "{S4}Absolute volume difference: {}", Measure::from(row.avd))?;
    write!(w, "{S4}Dice: {}", row.dice)?;
    Ok(())
}

/// 评估最终结果.
#[derive(Debug, Default)]
pub struct EvalResult {
    rows: Vec<(String, SubjectRow)>,
    summary: Summary,
    num_slices: usize,
}

impl EvalResult {
    pub fn push(&mut self, sub: String, row: SubjectRow) {
        self.rows.push((sub, row));
    }

    pub fn set_summary(&mut self, summary: Summary, num_slices: usize) {
        self.summary = summary;
        self.num_slices = num_slices;
    }

    /// 分析运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for (key, row) in self.rows.iter() {
            describe_into(key, row, &mut buf)?;
            println!("{}", String::from_utf8_lossy(&buf));
            buf.clear();

            utils::sep();
        }

        let avd: Vec<Measure> = self.rows.iter().map(|(_, r)| r.avd.into()).collect();
        let dice: Vec<Measure> = self.rows.iter().map(|(_, r)| r.dice).collect();
        println!("Subjects: {}", self.rows.len());
        println!("Mean absolute volume difference: {}", Measure::mean(&avd));
        println!("Mean dice: {}", Measure::mean(&dice));
        utils::sep();

        println!("Slice-wise metrics over {} slices:", self.num_slices);
        print!("{}", self.summary);
        utils::sep();
        Ok(())
    }
}
