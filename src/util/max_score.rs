/*
 * MIT License
 *
 * Copyright (c) 2022 Joseph Sacchini
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
///
/// Picks the highest scoring element of an iterator in a single pass, without allocating.
///
/// A later element only takes over when its score is *strictly* greater than the one held, so among
/// equal scores the element seen first wins. The quad search relies on this to resolve ties
/// reproducibly. Scores that don't compare (NaN) never take over.
///
pub trait MaxScoreExt: Iterator + Sized {
    fn first_max_by_score<Score, ScoreFn>(self, score_f: ScoreFn) -> Option<(Score, Self::Item)>
    where
        ScoreFn: Fn(&Self::Item) -> Score,
        Score: PartialOrd<Score>,
    {
        let mut best: Option<(Score, Self::Item)> = None;
        for next in self {
            let score = score_f(&next);
            let better = match &best {
                Some((held, _)) => held < &score,
                None => true,
            };

            if better {
                best = Some((score, next));
            }
        }

        best
    }
}

impl<I> MaxScoreExt for I where I: Iterator + Sized {}
