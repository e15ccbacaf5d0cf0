use std::{collections::BTreeMap, fmt};

use sightline_error::PrefixError;

use super::CharSet;
use crate::config::PrefixConfig;

/// Узел префиксного дерева.
///
/// Каждый узел принадлежит только своему родителю; обратных ссылок нет.
/// Дети хранятся в `BTreeMap`, поэтому обход идёт в лексикографическом
/// порядке.
///
/// Глубина дерева равна длине самого длинного слова, поэтому ни один обход
/// (включая `Drop`) не рекурсивен: стек потока не ограничивает длину слова.
#[derive(Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    terminal: bool,
}

/// Префиксный индекс для автодополнения и поиска.
///
/// **ИНВАРИАНТЫ:**
///
/// - путь от корня, образующий слово `W`, заканчивается узлом с
///   `terminal == true` тогда и только тогда, когда `W` вставлено и не
///   удалено;
/// - `len` равно числу терминальных узлов;
/// - после `delete` не остаётся нетерминальных листьев (кроме корня).
///
/// Любая операция над символом вне алфавита завершается
/// [`PrefixError::InvalidCharacter`], индекс при этом не меняется.
///
/// Из инвариантов следует, что форма дерева определяется набором слов:
/// клонирование и сравнение идут через слова.
pub struct PrefixIndex {
    root: TrieNode,
    len: usize,
    case_sensitive: bool,
    alphabet: CharSet,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl TrieNode {
    fn descend(
        &self,
        chars: &[char],
    ) -> Option<&TrieNode> {
        chars
            .iter()
            .try_fold(self, |node, ch| node.children.get(ch))
    }

    /// Терминальный узел в конце пути, узлы создаются по дороге.
    fn insert(
        &mut self,
        chars: &[char],
    ) -> &mut TrieNode {
        chars.iter().fold(self, |node, &ch| {
            node.children.entry(ch).or_default()
        })
    }

    fn count_nodes(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.values());
        }
        count
    }

    /// Собирает до `limit` слов поддерева в лексикографическом порядке.
    ///
    /// `buf` содержит путь до `self`. Обход в глубину на явном стеке
    /// итераторов: на каждый уровень ниже `self` в `buf` лежит один символ.
    fn collect(
        &self,
        mut buf: String,
        limit: usize,
        out: &mut Vec<String>,
    ) {
        if out.len() >= limit {
            return;
        }
        if self.terminal {
            out.push(buf.clone());
        }

        let mut stack = vec![self.children.iter()];
        while let Some(level) = stack.last_mut() {
            if out.len() >= limit {
                return;
            }

            match level.next() {
                Some((&ch, child)) => {
                    buf.push(ch);
                    if child.terminal {
                        out.push(buf.clone());
                    }
                    stack.push(child.children.iter());
                }
                None => {
                    stack.pop();
                    if !stack.is_empty() {
                        buf.pop();
                    }
                }
            }
        }
    }

    /// Снимает терминальный флаг в конце пути и обрезает опустевшую ветвь.
    ///
    /// Ветвь, которая держалась только на удалённом слове, начинается ниже
    /// самого глубокого узла пути, который является корнем, словом или
    /// развилкой. Она отрезается одним `remove`.
    fn delete(
        &mut self,
        chars: &[char],
    ) -> bool {
        let mut cut = 0;
        let mut node: &TrieNode = self;
        for (depth, ch) in chars.iter().enumerate() {
            if node.terminal || node.children.len() > 1 {
                cut = depth;
            }
            match node.children.get(ch) {
                Some(child) => node = child,
                None => return false,
            }
        }

        if !node.terminal {
            return false;
        }

        if !node.children.is_empty() || chars.is_empty() {
            self.insert(chars).terminal = false;
            return true;
        }

        let parent = self.insert(&chars[..cut]);
        parent.children.remove(&chars[cut]);
        true
    }
}

impl Drop for TrieNode {
    fn drop(&mut self) {
        let mut stack: Vec<TrieNode> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

impl PrefixIndex {
    /// Создаёт пустой индекс по конфигурации.
    pub fn new(config: &PrefixConfig) -> Result<Self, PrefixError> {
        config.alphabet.validate()?;

        Ok(Self {
            root: TrieNode::default(),
            len: 0,
            case_sensitive: config.case_sensitive,
            alphabet: config.alphabet.clone(),
        })
    }

    /// Вставляет слово за O(L). Повторная вставка ничего не меняет.
    ///
    /// Возвращает `true`, если слова раньше не было.
    pub fn insert(
        &mut self,
        word: &str,
    ) -> Result<bool, PrefixError> {
        let chars = self.normalize(word)?;

        let node = self.root.insert(&chars);
        if node.terminal {
            return Ok(false);
        }

        node.terminal = true;
        self.len += 1;

        Ok(true)
    }

    /// Точное совпадение за O(L).
    pub fn contains(
        &self,
        word: &str,
    ) -> Result<bool, PrefixError> {
        let chars = self.normalize(word)?;
        Ok(self.root.descend(&chars).is_some_and(|node| node.terminal))
    }

    /// Есть ли хотя бы одно слово с таким префиксом. O(L).
    ///
    /// Пустой префикс совпадает с любым словом, поэтому для пустого индекса
    /// возвращается `false`.
    pub fn has_prefix(
        &self,
        prefix: &str,
    ) -> Result<bool, PrefixError> {
        let chars = self.normalize(prefix)?;

        // Ветви без слов удаляются в `delete`, так что любой найденный узел
        // ведёт хотя бы к одному терминалу; исключение только корень.
        Ok(match self.root.descend(&chars) {
            Some(node) if chars.is_empty() => node.terminal || !node.children.is_empty(),
            Some(_) => true,
            None => false,
        })
    }

    /// До `limit` слов с данным префиксом в лексикографическом порядке.
    ///
    /// Порядок вставки не сохраняется: недавние запросы хранит отдельный
    /// LRU-кэш координатора.
    pub fn autocomplete(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, PrefixError> {
        let chars = self.normalize(prefix)?;

        let mut out = Vec::new();
        if limit == 0 {
            return Ok(out);
        }

        if let Some(node) = self.root.descend(&chars) {
            node.collect(chars.iter().collect(), limit, &mut out);
        }

        Ok(out)
    }

    /// Удаляет слово. Возвращает `true`, если оно было в индексе.
    pub fn delete(
        &mut self,
        word: &str,
    ) -> Result<bool, PrefixError> {
        let chars = self.normalize(word)?;

        let removed = self.root.delete(&chars);
        if removed {
            self.len -= 1;
        }

        Ok(removed)
    }

    /// Все слова в лексикографическом порядке.
    pub fn words(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect(String::new(), usize::MAX, &mut out);
        out
    }

    /// Количество слов.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Количество узлов, включая корень.
    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }

    /// Удаляет все слова.
    pub fn clear(&mut self) {
        self.root = TrieNode::default();
        self.len = 0;
    }

    fn normalize(
        &self,
        word: &str,
    ) -> Result<Vec<char>, PrefixError> {
        self.alphabet.normalize(word, self.case_sensitive)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для PrefixIndex
////////////////////////////////////////////////////////////////////////////////

impl Clone for PrefixIndex {
    fn clone(&self) -> Self {
        let mut root = TrieNode::default();
        for word in self.words() {
            let chars: Vec<char> = word.chars().collect();
            root.insert(&chars).terminal = true;
        }

        Self {
            root,
            len: self.len,
            case_sensitive: self.case_sensitive,
            alphabet: self.alphabet.clone(),
        }
    }
}

impl PartialEq for PrefixIndex {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.case_sensitive == other.case_sensitive
            && self.alphabet == other.alphabet
            && self.len == other.len
            && self.words() == other.words()
    }
}

impl Eq for PrefixIndex {}

impl fmt::Debug for PrefixIndex {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("PrefixIndex")
            .field("len", &self.len)
            .field("case_sensitive", &self.case_sensitive)
            .field("alphabet", &self.alphabet)
            .finish_non_exhaustive()
    }
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self {
            root: TrieNode::default(),
            len: 0,
            case_sensitive: true,
            alphabet: CharSet::Any,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
