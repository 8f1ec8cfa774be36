//! Source sentence batches.
//!
//! A [`Sentence`] holds one token stream per tab (multi-source models translate
//! from several parallel inputs). A [`Sentences`] batch is read column-wise by
//! the encoder: timestep `t` of the batch is the `t`-th factor bundle of every
//! sentence, with sentences shorter than `t + 1` padded by [`EOS_ID`].

use crate::error::{EncoderError, Result};

/// Token id within one factor's vocabulary.
pub type Word = u32;

/// One token position: one word per factor.
pub type FactorBundle = Vec<Word>;

/// End-of-sentence id, also used for padding past a sentence's end
pub const EOS_ID: Word = 0;

/// Reserved row for out-of-vocabulary ids
pub const UNK_ID: Word = 1;

/// A source sentence with one token stream per tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    line_num: usize,
    streams: Vec<Vec<FactorBundle>>,
}

impl Sentence {
    pub fn new(line_num: usize, streams: Vec<Vec<FactorBundle>>) -> Self {
        Self { line_num, streams }
    }

    /// Single-source, single-factor sentence from plain word ids.
    pub fn from_words(line_num: usize, words: &[Word]) -> Self {
        Self::new(line_num, vec![words.iter().map(|&w| vec![w]).collect()])
    }

    pub fn line_num(&self) -> usize {
        self.line_num
    }

    pub fn tab_count(&self) -> usize {
        self.streams.len()
    }

    pub fn words(&self, tab: usize) -> Result<&[FactorBundle]> {
        self.streams
            .get(tab)
            .map(|s| s.as_slice())
            .ok_or(EncoderError::TabOutOfRange {
                tab,
                available: self.streams.len(),
            })
    }

    pub fn len(&self, tab: usize) -> Result<usize> {
        Ok(self.words(tab)?.len())
    }

    pub fn is_empty(&self, tab: usize) -> Result<bool> {
        Ok(self.len(tab)? == 0)
    }
}

/// A fixed batch of sentences encoded together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentences {
    sentences: Vec<Sentence>,
}

impl Sentences {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    pub fn push(&mut self, sentence: Sentence) {
        self.sentences.push(sentence);
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sentence> {
        self.sentences.iter()
    }

    /// True token count of every sentence in stream `tab`.
    pub fn lengths(&self, tab: usize) -> Result<Vec<usize>> {
        self.sentences.iter().map(|s| s.len(tab)).collect()
    }

    pub fn max_length(&self, tab: usize) -> Result<usize> {
        Ok(self.lengths(tab)?.into_iter().max().unwrap_or(0))
    }

    /// Factor bundles at timestep `pos` across the batch, padded with `EOS_ID`.
    ///
    /// Fails if any real token does not carry exactly `factor_count` factors.
    pub fn words_at(
        &self,
        pos: usize,
        tab: usize,
        factor_count: usize,
    ) -> Result<Vec<FactorBundle>> {
        self.sentences
            .iter()
            .map(|s| match s.words(tab)?.get(pos) {
                Some(bundle) if bundle.len() == factor_count => Ok(bundle.clone()),
                Some(bundle) => Err(EncoderError::FactorCountMismatch {
                    position: pos,
                    expected: factor_count,
                    found: bundle.len(),
                }),
                None => Ok(vec![EOS_ID; factor_count]),
            })
            .collect()
    }
}

impl FromIterator<Sentence> for Sentences {
    fn from_iter<I: IntoIterator<Item = Sentence>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Sentences {
    type Item = &'a Sentence;
    type IntoIter = std::slice::Iter<'a, Sentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences.iter()
    }
}
